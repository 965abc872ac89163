// src/handler/bookings.rs
use std::sync::Arc;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::bookingdb::BookingExt,
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    models::{bookingmodel::BookingStatus, usermodel::UserRole},
    ws::events::ServerEvent,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingDto {
    #[validate(length(min = 1, max = 200))]
    pub service: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[serde(rename = "scheduledFor")]
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusDto {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct BookingListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn bookings_handler() -> Router {
    Router::new()
        .route("/bookings", get(get_bookings).post(create_booking))
        .route("/my-bookings", get(get_my_bookings))
        .route(
            "/bookings/:booking_id",
            get(get_booking).delete(delete_booking),
        )
        .route("/bookings/:booking_id/status", put(update_status))
        .route("/bookings/:booking_id/read", put(mark_as_read))
        .route("/bookings/:booking_id/cancel", put(cancel_booking))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .db_client
        .create_booking(auth.user.id, body.service, body.address, body.scheduled_for)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .events
        .broadcast(ServerEvent::NewBooking(booking.clone()))
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": booking
    })))
}

pub async fn get_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<BookingListParams>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let bookings = app_state
        .db_client
        .get_bookings(limit, (page - 1) * limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": bookings
    })))
}

pub async fn get_my_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bookings = app_state
        .db_client
        .get_user_bookings(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": bookings
    })))
}

pub async fn get_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .db_client
        .get_booking(booking_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    if !auth.user.role.is_admin() && booking.user_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to access this booking",
        ));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": booking
    })))
}

pub async fn update_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let booking = app_state
        .db_client
        .update_booking_status(booking_id, body.status, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    app_state
        .events
        .broadcast(ServerEvent::BookingUpdated(booking.clone()))
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": booking
    })))
}

/// Owner-side cancellation. Admins use the status route instead.
pub async fn cancel_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .db_client
        .get_booking(booking_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    if booking.user_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to access this booking",
        ));
    }

    if !booking.status.user_cancellable() {
        return Err(HttpError::bad_request("Booking can no longer be cancelled"));
    }

    let booking = app_state
        .db_client
        .update_booking_status(booking_id, BookingStatus::Cancelled, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    app_state
        .events
        .broadcast(ServerEvent::BookingUpdated(booking.clone()))
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": booking
    })))
}

pub async fn mark_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let booking = app_state
        .db_client
        .mark_booking_read(booking_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": booking
    })))
}

pub async fn delete_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::SuperAdmin {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let deleted = app_state
        .db_client
        .delete_booking(booking_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if deleted == 0 {
        return Err(HttpError::not_found("Booking not found"));
    }

    app_state
        .events
        .broadcast(ServerEvent::BookingDeleted { id: booking_id })
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Booking deleted"
    })))
}
