//! Shared application state passed to route builders.

use axum_helpers::JwtAuth;
use mongodb::{Client, Database};

use crate::config::Config;

/// Cloned into each route builder (cheap Arc clones)
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    pub db: Database,
    /// Issues tokens at login and verifies them on protected routes
    pub jwt: JwtAuth,
}
