//! Mapping from lifecycle errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use gatehouse_accounts::LifecycleError;

/// Uniform error body: `{"error": <code>, "message": <human text>}`.
pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": code, "message": message.into() })),
    )
        .into_response()
}

pub fn lifecycle_error(err: LifecycleError) -> Response {
    match err {
        LifecycleError::Validation(fields) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_error", "fields": fields })),
        )
            .into_response(),
        LifecycleError::InvalidLink => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_link",
            "Invalid verification link",
        ),
        LifecycleError::InvalidToken => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_token",
            "Invalid or expired token",
        ),
        LifecycleError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "User not found")
        }
        LifecycleError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "storage backend failure",
            )
        }
        LifecycleError::Internal(msg) => {
            tracing::error!(error = %msg, "internal failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}
