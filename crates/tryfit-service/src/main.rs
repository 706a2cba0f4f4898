//! Tryfit Service - HTTP API for virtual try-on and credits
//!
//! This is the main entry point for the tryfit service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tryfit_service::{create_router, AppState, ServiceConfig};
use tryfit_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tryfit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tryfit Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    if config.uses_default_jwt_secret() {
        tracing::warn!("TRYFIT_JWT_SECRET not set - using the development default");
    }
    if config.payment_webhook_secret.is_none() {
        tracing::warn!("TRYFIT_PAYMENT_WEBHOOK_SECRET not set - webhook signatures will not be verified");
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        providers = config.providers.len(),
        admin_configured = %config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = RocksStore::open(&config.data_dir)?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
