//! Events API routes
//!
//! Wires the events domain to MongoDB and to the users domain for profiles.

use axum::Router;
use domain_events::{EventService, MongoEventRepository, MongoResponseRepository};
use std::sync::Arc;
use tracing::info;

use super::users::Users;
use crate::state::AppState;

/// Create the events and search router
pub fn router(state: &AppState, users: Users) -> Router {
    let service = EventService::new(
        MongoEventRepository::new(&state.db),
        MongoResponseRepository::new(&state.db),
        Arc::new(users),
    )
    .with_timeout(state.config.store.timeout);

    domain_events::router(service)
}

/// Initialize event and response indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoEventRepository::new(db)
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create event indexes: {}", e))?;
    MongoResponseRepository::new(db)
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create response indexes: {}", e))?;
    info!("Event collection indexes created");
    Ok(())
}
