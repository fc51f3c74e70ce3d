//! scrivo-api - HTTP API server for scrivo

use scrivo_api::logging::{init_tracing, LogConfig};
use scrivo_api::{build_router, AppState, ServerConfig};
use scrivo_db::{Database, MemoryStore, PoolConfig, Stores};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let log_config = LogConfig::from_env();
    let _file_guard = init_tracing(&log_config);
    info!(
        json = log_config.json,
        log_file = log_config.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env();
    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if config.rate_limit_enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.rate_limit_requests,
        config.rate_limit_period_secs
    );

    let stores = connect_stores(&config).await?;
    let state = AppState::new(stores, &config);

    match state.accounts.purge_expired_tokens().await {
        Ok(purged) => info!(result_count = purged, "Expired tokens purged"),
        Err(e) => warn!(error = %e, "Failed to purge expired tokens"),
    }

    let app = build_router(state, &config);

    // Start server
    let addr = config.bind_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn connect_stores(config: &ServerConfig) -> anyhow::Result<Stores> {
    if config.uses_memory_store() {
        warn!("Using in-memory store; all data is lost on exit");
        return Ok(MemoryStore::new().stores());
    }

    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env()).await?;
    info!("Database connected");

    info!("Running migrations...");
    db.migrate().await?;
    info!("Migrations complete");

    Ok(db.stores())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
