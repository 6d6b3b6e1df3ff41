//! # Shopkeep Server
//!
//! Binary entry point: load config, open the database, serve the API.
//!
//! ```text
//!  env ──► ServerConfig ──► Database (SQLite + migrations)
//!                                │
//!                                ▼
//!                     axum Router on SHOPKEEP_PORT
//! ```

use std::sync::Arc;

use shopkeep_db::{Database, DbConfig};
use shopkeep_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Shopkeep server...");

    let config = ServerConfig::load()?;
    info!(
        bind = %config.bind_address(),
        database = %config.database_path,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set, using the development secret");
    }

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Logs to stdout.
///
/// - `RUST_LOG=debug` shows everything at debug
/// - `RUST_LOG=shopkeep_db=trace` narrows to one crate
/// - Default: info, with debug for the shopkeep crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopkeep=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
