//! Lockbox Server
//!
//! Stores small typed secrets per user and keeps clients in sync through
//! versioned records and timestamp cursors.

use clap::Parser;
use lockbox_core::SqliteStore;
use lockbox_server::cleanup::spawn_cleanup_task;
use lockbox_server::{build_router, AppState, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lockbox-server", about = "Lockbox secret storage and sync server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lockbox.toml")]
    config: PathBuf,

    /// Listen address override
    #[arg(short, long)]
    listen: Option<String>,

    /// Database path override
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Token signing secret override
    #[arg(long, env = "LOCKBOX_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut cfg = if cli.config.exists() {
        ServerConfig::load(&cli.config)?
    } else {
        tracing::info!("No config file found, using defaults");
        ServerConfig::default()
    };

    if let Some(listen) = cli.listen {
        cfg.listen_addr = listen;
    }
    if let Some(database) = cli.database {
        cfg.storage_path = database;
    }
    if let Some(secret) = cli.token_secret {
        cfg.token_secret = Some(secret);
    }

    let secret = match cfg.token_secret.clone() {
        Some(secret) => secret.into_bytes(),
        None => {
            tracing::warn!(
                "No token secret configured; tokens will not survive a restart"
            );
            rand::random::<[u8; 32]>().to_vec()
        }
    };
    let session = cfg.session_config(secret)?;

    tracing::info!("Starting Lockbox server on {}", cfg.listen_addr);

    let store = SqliteStore::open(&cfg.storage_path)?;
    let state = AppState::new(store, session)?;
    let cleanup = spawn_cleanup_task(
        state.engine.clone(),
        cfg.deleted_retention(),
        cfg.cleanup_interval_secs,
    );
    let app = build_router(state, &cfg);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
