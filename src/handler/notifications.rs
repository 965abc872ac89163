// src/handler/notifications.rs
use std::sync::Arc;
use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new().route("/notifications/counts", get(get_counts))
}

/// Pull-side of the admin badge: the same counters the socket pushes, for
/// the initial page load.
pub async fn get_counts(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let counts = app_state
        .notifier
        .compute_counts()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": counts
    })))
}
