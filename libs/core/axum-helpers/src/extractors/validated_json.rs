//! JSON extractor with automatic validation using the validator crate.

use crate::errors::{ErrorCode, ErrorResponse};
use axum::{
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// JSON extractor that runs `Validate::validate` on the body.
///
/// ```ignore
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Invite {
///     #[validate(length(min = 1))]
///     user_ids: Vec<uuid::Uuid>,
/// }
///
/// async fn invite(ValidatedJson(payload): ValidatedJson<Invite>) -> String {
///     format!("Inviting {} users", payload.user_ids.len())
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let body = ErrorResponse::new(ErrorCode::JsonExtraction, e.body_text());
            (e.status(), Json(body)).into_response()
        })?;

        data.validate().map_err(validation_response)?;

        Ok(ValidatedJson(data))
    }
}

/// Field errors as `{field: [{code, message, params}]}`.
fn validation_response(errors: ValidationErrors) -> Response {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::json!(messages))
        })
        .collect::<serde_json::Map<_, _>>();

    let body = ErrorResponse::new(
        ErrorCode::ValidationError,
        ErrorCode::ValidationError.default_message(),
    )
    .with_details(serde_json::Value::Object(details));

    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
