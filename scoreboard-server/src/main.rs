//! scoreboard-server - Game scoreboard HTTP service
//!
//! Accepts score submissions keyed by device identity, enforces unique
//! display names, and serves the ranked leaderboard.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scoreboard_common::config::{load_config, ConfigOverrides};
use scoreboard_common::db::init::init_database;
use scoreboard_common::time::secs_to_duration;
use scoreboard_server::{build_router, AppState, SqliteScoreStore};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for scoreboard-server
#[derive(Parser, Debug)]
#[command(name = "scoreboard-server")]
#[command(about = "Game scoreboard HTTP service")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long, env = "SCOREBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Largest leaderboard a single request may ask for
    #[arg(long)]
    leaderboard_max_limit: Option<u32>,

    /// Per-request deadline in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// SQLite connection pool size
    #[arg(long)]
    max_connections: Option<u32>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            port: self.port,
            database_path: self.database.clone(),
            log_level: self.log_level.clone(),
            leaderboard_max_limit: self.leaderboard_max_limit,
            request_timeout_secs: self.request_timeout_secs,
            max_connections: self.max_connections,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Command line > environment > config file > compiled defaults
    let overrides = args.overrides().or(ConfigOverrides::from_env());
    let config = load_config(args.config.as_deref())
        .context("Failed to load configuration")?
        .apply_overrides(&overrides);
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting scoreboard-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_path = config.resolved_database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path, config.max_connections).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let store = Arc::new(SqliteScoreStore::new(pool.clone()));
    let state = AppState::with_store(store, config.leaderboard_max_limit);
    let app = build_router(state, secs_to_duration(config.request_timeout_secs));

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("scoreboard-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
