use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single field-level validation failure.
///
/// Serialized into the `errors` array of a 400 response so clients can
/// attach messages to the offending form field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `body.travelers`
    pub path: String,

    /// Human-readable message for the field
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Error taxonomy for the API.
///
/// Every handler returns `Result<_, ApiError>`; the `IntoResponse`
/// implementation maps each variant to its HTTP status and renders the
/// standard `{ success, data, message }` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more request fields failed validation (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Malformed input that is not tied to a single field (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid bearer credential (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role or ownership (403)
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint style duplicates (409)
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected (500); details are logged, not leaked
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Shorthand for a single-field validation error.
    pub fn invalid(path: &str, message: &str) -> Self {
        ApiError::Validation(vec![FieldError::new(path, message)])
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // 23505 = unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Conflict("Duplicate value for a unique field".to_string());
            }
        }
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "data": null,
                    "message": "Validation failed",
                    "errors": errors,
                }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, envelope(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, envelope(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, envelope(msg)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, envelope(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, envelope(msg)),
            ApiError::Internal(err) => {
                tracing::error!(error.cause_chain = ?err, "Unhandled server error");
                let body = if cfg!(debug_assertions) {
                    json!({
                        "success": false,
                        "data": null,
                        "message": "Server error",
                        "stack": format!("{err:?}"),
                    })
                } else {
                    envelope("Server error".to_string())
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

fn envelope(message: String) -> serde_json::Value {
    json!({
        "success": false,
        "data": null,
        "message": message,
    })
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_field_paths() {
        let err = ApiError::Validation(vec![
            FieldError::new("body.title", "Title must be at least 5 characters"),
            FieldError::new("body.price", "Price must be positive"),
        ]);

        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].path, "body.title");
            }
            _ => panic!("expected validation variant"),
        }
    }

    #[test]
    fn invalid_builds_single_field_error() {
        let err = ApiError::invalid("body.date", "Invalid date");
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].message, "Invalid date");
            }
            _ => panic!("expected validation variant"),
        }
    }
}
