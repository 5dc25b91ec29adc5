use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// The authenticated caller's user ID.
///
/// Requires [`jwt_auth_middleware`](super::jwt_auth_middleware) on the route;
/// without verified claims the request is rejected with 401.
///
/// ```ignore
/// async fn me(CurrentUser(user_id): CurrentUser) -> String {
///     user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        claims
            .user_id()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}
