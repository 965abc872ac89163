// src/handler/users.rs
use std::sync::Arc;
use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::{UserRole, UserStatus},
    ws::events::ServerEvent,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateRoleDto {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusDto {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WarnUserDto {
    #[validate(length(min = 1, max = 500))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceDto {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn users_handler() -> Router {
    Router::new()
        .route("/users/me", get(get_me))
        .route(
            "/users",
            get(get_users).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::SuperAdmin])
            })),
        )
        .route(
            "/users/:user_id/role",
            put(update_role).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::SuperAdmin])
            })),
        )
        .route(
            "/users/:user_id/status",
            put(update_status).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::SuperAdmin])
            })),
        )
        .route(
            "/users/:user_id/warn",
            post(warn_user).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::SuperAdmin])
            })),
        )
        .route(
            "/users/:user_id/dismiss-new",
            put(dismiss_new).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::SuperAdmin])
            })),
        )
        .route(
            "/maintenance/:page",
            put(set_maintenance).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::SuperAdmin])
            })),
        )
}

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": auth.user
    })))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, HttpError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let users = app_state
        .db_client
        .get_users(limit, (page - 1) * limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": users
    })))
}

pub async fn update_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateRoleDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .account_service
        .change_role(user_id, body.role)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": user
    })))
}

pub async fn update_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    if user_id == auth.user.id {
        return Err(HttpError::bad_request("Cannot change your own status"));
    }

    let user = app_state
        .account_service
        .change_status(user_id, body.status)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": user
    })))
}

pub async fn warn_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<WarnUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let delivered = app_state.account_service.warn(user_id, body.message).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "delivered": delivered }
    })))
}

pub async fn dismiss_new(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .dismiss_new_user(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": user
    })))
}

pub async fn set_maintenance(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(page): Path<String>,
    Json(body): Json<MaintenanceDto>,
) -> Result<impl IntoResponse, HttpError> {
    let record = app_state
        .db_client
        .set_maintenance(page, body.enabled)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .events
        .broadcast(ServerEvent::MaintenanceStatusChanged(record.clone()))
        .await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": record
    })))
}
