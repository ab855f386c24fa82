//! Configuration resolution for Divert.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (`--config`, else the global `settings.json` when present)
//! 3. Environment variables
//! 4. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Divert configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_path: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens.
    pub session_secret: String,
    /// Session lifetime in seconds. Default: 14 days.
    pub session_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: "dev-secret-change-me".to_string(),
            session_ttl_secs: 14 * 24 * 60 * 60,
        }
    }
}

/// Admin panel branding strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_header: String,
    pub site_title: String,
    pub index_title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_header: "Divert administration".to_string(),
            site_title: "Divert".to_string(),
            index_title: "Control panel".to_string(),
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicit `config_file` must exist; the global file is optional.
pub fn load_config(config_file: Option<&Path>) -> Result<Config> {
    let mut config = match config_file {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".divert").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/divert/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("divert").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Get the default database path.
pub fn database_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".divert").join("divert.db"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/divert/divert.db"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local").join("share"))
            })
            .map(|p| p.join("divert").join("divert.db"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("DIVERT_ADDR") {
        if let Ok(addr) = val.parse() {
            config.server.addr = addr;
        }
    }
    if let Some(val) = lookup("DIVERT_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("DIVERT_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(val) = lookup("DIVERT_SESSION_SECRET") {
        config.auth.session_secret = val;
    }
    if let Some(val) = lookup("DIVERT_SESSION_TTL") {
        if let Ok(n) = val.parse() {
            config.auth.session_ttl_secs = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_session_ttl_is_two_weeks() {
        let config = Config::default();
        assert_eq!(config.auth.session_ttl_secs, 1_209_600);
        assert_eq!(config.server.addr.port(), 8000);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"site": {{"site_title": "Traffic"}}}}"#).unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.site.site_title, "Traffic");
        assert_eq!(config.site.site_header, "Divert administration");
        assert_eq!(config.server.log_level, "info");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/divert.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("DIVERT_ADDR", "0.0.0.0:9000"),
            ("DIVERT_SESSION_TTL", "not-a-number"),
            ("DIVERT_SESSION_SECRET", "s3cret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(ToString::to_string));

        assert_eq!(config.server.addr.port(), 9000);
        assert_eq!(config.auth.session_secret, "s3cret");
        assert_eq!(config.auth.session_ttl_secs, 1_209_600);
    }
}
