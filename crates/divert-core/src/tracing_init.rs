//! Shared tracing/logging initialization.
//!
//! The server binary and its admin subcommands use the same pattern for
//! setting up `tracing_subscriber` with an env-filter and optional JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the env-filter directive for a crate and level, e.g.
/// `("divert_server", "debug")` → `"divert_server=debug,tower_http=debug"`.
pub fn default_directive(crate_name: &str, level: &str) -> String {
    format!("{crate_name}={level},divert_core={level},tower_http={level}")
}

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- default `RUST_LOG` value when the env-var is not set
///   (see [`default_directive`]).
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_http_layer() {
        let d = default_directive("divert_server", "debug");
        assert!(d.starts_with("divert_server=debug"));
        assert!(d.contains("tower_http=debug"));
    }
}
