//! Administrative account routes. All of these sit behind the bearer-token
//! middleware; on top of that, every handler requires the admin role.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::Path};
use serde::Deserialize;
use serde_json::json;

use gatehouse_core::AccountId;

use crate::app::{AppServices, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/pending-users", get(pending_users))
        .route("/approve/:user_id", post(approve))
        .route("/reject/:user_id", post(reject))
        .route("/toggle-status/:user_id", post(toggle_status))
        .route("/reset-password/:user_id", post(reset_password))
        .route("/user-logs/:user_id", get(user_logs))
}

fn forbid_non_admin(principal: &PrincipalContext) -> Option<Response> {
    if principal.is_admin() {
        None
    } else {
        Some(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "administrator role required",
        ))
    }
}

/// A path segment that is not a well-formed id cannot name any account, so it
/// gets the same 404 as an unknown id.
fn parse_id(raw: &str) -> Result<AccountId, Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::NOT_FOUND, "not_found", "User not found")
    })
}

async fn pending_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }

    match services.lifecycle.pending_accounts().await {
        Ok(accounts) => {
            let users: Vec<_> = accounts
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "username": a.username,
                        "email": a.email,
                        "role": a.role,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!(users))).into_response()
        }
        Err(e) => errors::lifecycle_error(e),
    }
}

async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }
    let id = match parse_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.approve(id).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": "User approved" }))).into_response(),
        Err(e) => errors::lifecycle_error(e),
    }
}

async fn reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }
    let id = match parse_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.reject(id).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": "User rejected" }))).into_response(),
        Err(e) => errors::lifecycle_error(e),
    }
}

async fn toggle_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }
    let id = match parse_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.toggle_status(id).await {
        Ok(account) => {
            let message = if account.is_active {
                "User activated successfully"
            } else {
                "User deactivated successfully"
            };
            (StatusCode::OK, Json(json!({ "success": message }))).into_response()
        }
        Err(e) => errors::lifecycle_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    new_password: Option<String>,
}

async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }
    let id = match parse_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let new_password = body.new_password.unwrap_or_default();
    match services.lifecycle.reset_password(id, &new_password).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "success": "Password reset successfully" })),
        )
            .into_response(),
        Err(e) => errors::lifecycle_error(e),
    }
}

async fn user_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
) -> Response {
    if let Some(resp) = forbid_non_admin(&principal) {
        return resp;
    }
    let id = match parse_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.audit_trail(id).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "logs": entries }))).into_response(),
        Err(e) => errors::lifecycle_error(e),
    }
}
