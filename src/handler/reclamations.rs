// src/handler/reclamations.rs
use std::sync::Arc;
use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::reclamationdb::ReclamationExt,
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    ws::events::ServerEvent,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReclamationDto {
    #[serde(rename = "bookingId")]
    pub booking_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
}

pub fn reclamations_handler() -> Router {
    Router::new()
        .route(
            "/reclamations",
            get(get_reclamations).post(create_reclamation),
        )
        .route("/my-reclamations", get(get_my_reclamations))
        .route("/reclamations/:reclamation_id/read", put(mark_as_read))
        .route("/reclamations/:reclamation_id/hide", put(hide_reclamation))
        .route(
            "/reclamations/:reclamation_id/unhide",
            put(unhide_reclamation),
        )
        .route(
            "/reclamations/:reclamation_id/handle",
            put(handle_reclamation),
        )
}

pub async fn create_reclamation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReclamationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let reclamation = app_state
        .db_client
        .create_reclamation(auth.user.id, body.booking_id, body.subject, body.description)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .events
        .broadcast(ServerEvent::NewReclamation(reclamation.clone()))
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamation
    })))
}

pub async fn get_reclamations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let reclamations = app_state
        .db_client
        .get_reclamations(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamations
    })))
}

pub async fn get_my_reclamations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let reclamations = app_state
        .db_client
        .get_user_reclamations(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamations
    })))
}

pub async fn mark_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(reclamation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let reclamation = app_state
        .db_client
        .mark_reclamation_read(reclamation_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Reclamation not found"))?;

    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamation
    })))
}

/// Per-admin mask. Other admins keep seeing the reclamation; the frontend
/// of every admin still learns the id so open detail views can close.
pub async fn hide_reclamation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(reclamation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let reclamation = app_state
        .db_client
        .hide_reclamation(reclamation_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Reclamation not found"))?;

    app_state
        .events
        .broadcast(ServerEvent::ReclamationHidden { id: reclamation_id })
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamation
    })))
}

pub async fn unhide_reclamation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(reclamation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let reclamation = app_state
        .db_client
        .unhide_reclamation(reclamation_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Reclamation not found"))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamation
    })))
}

pub async fn handle_reclamation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(reclamation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let reclamation = app_state
        .db_client
        .handle_reclamation(reclamation_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Reclamation not found"))?;

    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": reclamation
    })))
}
