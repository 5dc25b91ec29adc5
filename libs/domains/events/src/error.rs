//! Event domain error types

use axum_helpers::AppError;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Result type for event operations
pub type EventResult<T> = std::result::Result<T, EventError>;

/// Event domain errors
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    NotFound(Uuid),

    /// Caller lacks the role the action needs
    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Store call exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for EventError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Database(format!("BSON serialization error: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for EventError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::Database(format!("BSON deserialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for EventError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

// Convert to axum_helpers::AppError for HTTP responses
impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => AppError::NotFound("Event not found".to_string()),
            EventError::Forbidden(msg) => AppError::Forbidden(msg),
            EventError::Validation(msg) => AppError::BadRequest(msg),
            EventError::Conflict(msg) => AppError::Conflict(msg),
            EventError::Database(msg) => AppError::Database(msg),
            EventError::Timeout(after) => AppError::StoreTimeout(format!("{:?}", after)),
            EventError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl axum::response::IntoResponse for EventError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
