//! Users API routes

use axum::Router;
use domain_users::{MongoUserRepository, UserService};
use tracing::info;

use crate::state::AppState;

pub type Users = UserService<MongoUserRepository>;

pub fn service(state: &AppState) -> Users {
    UserService::new(MongoUserRepository::new(&state.db), state.jwt.clone())
}

/// Register and login; the token cookie is `Secure` in production
pub fn auth_router(state: &AppState, users: Users) -> Router {
    domain_users::handlers::auth_router(users, state.config.environment.is_production())
}

/// Initialize user indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoUserRepository::new(db)
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create user indexes: {}", e))?;
    info!("User collection indexes created");
    Ok(())
}
