//! Public (unauthenticated) account routes: registration and email
//! verification.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::Path};
use serde::Deserialize;
use serde_json::json;

use gatehouse_accounts::NewRegistration;
use gatehouse_auth::Role;

use crate::app::{AppServices, errors};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email/:encoded_id/:token", get(verify_email))
}

/// Raw registration body. Fields are optional here so that a missing field
/// surfaces as a per-field validation error rather than a deserialization
/// failure.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<Role>,
}

async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let registration = NewRegistration {
        username: body.username.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        role: body.role,
    };

    match services.lifecycle.register(registration).await {
        Ok(outcome) => {
            // Account creation succeeded either way; the message tells the
            // caller whether the verification mail actually went out.
            let message = if outcome.email_sent {
                "User registered. Verify your email first."
            } else {
                "User registered, but email failed to send."
            };
            (
                StatusCode::CREATED,
                Json(json!({ "id": outcome.account.id, "message": message })),
            )
                .into_response()
        }
        Err(e) => errors::lifecycle_error(e),
    }
}

async fn verify_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path((encoded_id, token)): Path<(String, String)>,
) -> Response {
    match services.lifecycle.verify_email(&encoded_id, &token).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": "Email verified successfully. Wait for admin approval."
            })),
        )
            .into_response(),
        Err(e) => errors::lifecycle_error(e),
    }
}
