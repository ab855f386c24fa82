//! Divert back office server.
//!
//! Serves the account pages and the staff admin panel, and provides the
//! account bootstrap subcommands.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use divert_core::config::{self, Config};
use divert_core::tracing_init::{default_directive, init_tracing};
use divert_server::accounts::{self, NewAccount};
use divert_server::server::{AppState, build_router};
use divert_server::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "divert-server")]
#[command(version, about = "Divert back office - links, work orders and numbers")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Address to listen on.
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Create a staff superuser.
    CreateSuperuser(AccountArgs),
    /// Create a regular account.
    CreateAccount {
        #[command(flatten)]
        account: AccountArgs,

        /// Maximum number of links the account may own.
        #[arg(long)]
        link_quota: Option<i64>,

        /// Membership level.
        #[arg(long)]
        level: Option<i64>,
    },
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// Login name.
    #[arg(long)]
    name: String,

    /// Password. Without one the account cannot log in until it is set.
    #[arg(long, env = "DIVERT_PASSWORD")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(path) = &cli.db_path {
        config.server.database_path = Some(path.clone());
    }
    if cli.log_json {
        config.server.log_json = true;
    }

    init_tracing(
        &default_directive("divert_server", &config.server.log_level),
        config.server.log_json,
    );

    let db_path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    let db = open_database(&db_path).await?;

    match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            serve(db, config).await
        }
        Command::CreateSuperuser(args) => {
            let account = accounts::create_superuser(
                &db,
                NewAccount::new(args.name, args.password.as_deref()),
            )
            .await?;
            info!(account_id = account.id, name = %account.name, "Superuser ready");
            Ok(())
        }
        Command::CreateAccount {
            account,
            link_quota,
            level,
        } => {
            let new = NewAccount {
                link_quota,
                level,
                ..NewAccount::new(account.name, account.password.as_deref())
            };
            let created = accounts::create_account(&db, new).await?;
            info!(
                account_id = created.id,
                link_quota = created.link_quota,
                "Account ready"
            );
            Ok(())
        }
    }
}

async fn serve(db: Database, config: Config) -> anyhow::Result<()> {
    let addr = config.server.addr;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        "Starting divert-server"
    );

    spawn_session_cleanup(db.clone());

    let state = AppState::new(
        db,
        config.auth.session_secret.as_bytes(),
        config.auth.session_ttl_secs,
        config.site,
    );
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Hourly removal of revoked and expired sessions with their flash messages.
fn spawn_session_cleanup(db: Database) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            match db.delete_expired_sessions().await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "Background session cleanup completed");
                }
                Err(e) => {
                    warn!(error = %e, "Background session cleanup failed");
                }
                _ => {}
            }
        }
    });
}

async fn open_database(path: &Path) -> anyhow::Result<Database> {
    info!(path = %path.display(), "Opening database");
    Ok(Database::open(path).await?)
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = config::database_path() {
        return Ok(path);
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".divert").join("divert.db"))
}
