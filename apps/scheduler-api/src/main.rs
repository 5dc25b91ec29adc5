use axum_helpers::{
    JwtAuth,
    server::{create_production_app, health_router},
};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(database = %config.mongodb.database(), "Connecting to MongoDB");

    let mongo_client = database::mongodb::connect_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    api::events::init_indexes(&db).await?;
    api::users::init_indexes(&db).await?;

    let state = AppState {
        jwt: JwtAuth::new(&config.jwt),
        config,
        mongo_client,
        db,
    };

    let api_routes = api::routes(&state);

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    let app = router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()));

    info!(
        store_timeout_ms = state.config.store.timeout.as_millis() as u64,
        "Starting Scheduler API (30s shutdown timeout)"
    );

    let server_config = state.config.server.clone();
    let mongo_client = state.mongo_client.clone();

    create_production_app(
        app,
        &server_config,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing MongoDB connections");
            mongo_client.shutdown().await;
            info!("MongoDB connection closed successfully");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Scheduler API shutdown complete");
    Ok(())
}
