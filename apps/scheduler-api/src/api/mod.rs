//! API routes module
//!
//! Public auth routes plus everything behind the JWT middleware. All of it is
//! nested under /api by `axum_helpers::create_router`.

pub mod events;
pub mod health;
pub mod users;

use axum::{Router, middleware};
use axum_helpers::jwt_auth_middleware;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    let users = users::service(state);

    let protected = Router::new()
        .merge(events::router(state, users.clone()))
        .merge(domain_users::handlers::router(users.clone()))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(users::auth_router(state, users))
        .merge(protected)
}
