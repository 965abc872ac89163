// src/handler/tickets.rs
use std::sync::Arc;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::ticketdb::TicketExt,
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    models::{
        ticketmodel::*,
        usermodel::UserRole,
    },
    ws::events::ServerEvent,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    pub message: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageDto {
    pub message: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditMessageDto {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReactDto {
    #[validate(length(min = 1, max = 32))]
    pub emoji: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ArchiveScope {
    User,
    Admin,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveTicketDto {
    pub archived: Option<bool>,
    pub scope: Option<ArchiveScope>,
}

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/tickets", get(get_tickets).post(create_ticket))
        .route("/my-tickets", get(get_my_tickets))
        .route("/tickets/:ticket_id", get(get_ticket).delete(delete_ticket))
        .route("/tickets/:ticket_id/claim", put(claim_ticket))
        .route("/tickets/:ticket_id/read", put(mark_as_read))
        .route("/tickets/:ticket_id/archive", put(archive_ticket))
        .route("/tickets/:ticket_id/hide", put(hide_ticket))
        .route("/tickets/:ticket_id/unhide", put(unhide_ticket))
        .route("/tickets/:ticket_id/close", put(close_ticket))
        .route("/tickets/:ticket_id/messages", post(add_message))
        .route(
            "/tickets/:ticket_id/messages/:message_id",
            put(edit_message).delete(delete_message),
        )
        .route(
            "/tickets/:ticket_id/messages/:message_id/reactions",
            post(react_to_message),
        )
}

/// A message needs text or at least one attachment; rejected before any
/// state mutation otherwise.
fn validate_message_content(
    message: &Option<String>,
    attachments: &Option<Vec<Attachment>>,
) -> Result<(String, Vec<Attachment>), HttpError> {
    let text = message.clone().unwrap_or_default();
    let attachments = attachments.clone().unwrap_or_default();

    if text.trim().is_empty() && attachments.is_empty() {
        return Err(HttpError::bad_request(ErrorMessage::EmptyMessage.to_string()));
    }

    Ok((text, attachments))
}

async fn broadcast_ticket_update(app_state: &Arc<AppState>, ticket_id: Uuid) {
    match app_state.db_client.get_ticket_populated(ticket_id).await {
        Ok(Some(populated)) => {
            app_state
                .events
                .broadcast(ServerEvent::TicketUpdated(populated))
                .await;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, ticket_id = %ticket_id, "failed to load ticket for broadcast");
        }
    }
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (text, attachments) = validate_message_content(&body.message, &body.attachments)?;

    let ticket = app_state
        .db_client
        .create_ticket(auth.user.id, body.subject, text, attachments)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if let Ok(Some(populated)) = app_state.db_client.get_ticket_populated(ticket.id).await {
        app_state
            .events
            .broadcast(ServerEvent::NewTicket(populated))
            .await;
    }
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn get_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<TicketQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let tickets = app_state
        .db_client
        .get_tickets(auth.user.id, params.archived.unwrap_or(false))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": tickets
    })))
}

pub async fn get_my_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<TicketQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let tickets = app_state
        .db_client
        .get_user_tickets(auth.user.id, params.archived.unwrap_or(false))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": tickets
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .db_client
        .get_ticket_populated(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    if !auth.user.role.is_admin() && ticket.ticket.ticket.user_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to access this ticket",
        ));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn add_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<CreateMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (text, attachments) = validate_message_content(&body.message, &body.attachments)?;

    let ticket = app_state
        .db_client
        .get_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    if ticket.status == TicketStatus::Closed {
        return Err(HttpError::bad_request("Ticket is closed"));
    }

    if !auth.user.role.is_admin() && ticket.user_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to access this ticket",
        ));
    }

    let sender_type = if auth.user.role.is_admin() {
        SenderType::Admin
    } else {
        SenderType::User
    };

    let message = app_state
        .db_client
        .append_message(ticket_id, Some(auth.user.id), sender_type, text, attachments)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    broadcast_ticket_update(&app_state, ticket_id).await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn claim_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let existing = app_state
        .db_client
        .get_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    let reclaim = auth.user.role == UserRole::SuperAdmin;

    let ticket = app_state
        .db_client
        .claim_ticket(ticket_id, auth.user.id, reclaim)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let Some(ticket) = ticket else {
        // The conditional update lost: someone else holds the claim.
        if existing.assigned_admin.is_some() {
            return Err(HttpError::conflict(
                ErrorMessage::TicketAlreadyClaimed.to_string(),
            ));
        }
        return Err(HttpError::not_found("Ticket not found"));
    };

    broadcast_ticket_update(&app_state, ticket_id).await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn mark_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = if auth.user.role.is_admin() {
        let ticket = app_state
            .db_client
            .mark_read_admin(ticket_id, auth.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

        app_state.notifier.broadcast_counts().await;
        ticket
    } else {
        app_state
            .db_client
            .mark_read_user(ticket_id, auth.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Ticket not found"))?
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn edit_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((ticket_id, message_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<EditMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .db_client
        .get_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .filter(|m| m.ticket_id == ticket_id)
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    if message.sender_id != Some(auth.user.id) {
        return Err(HttpError::unauthorized(
            "Only the sender can edit this message",
        ));
    }

    let message = app_state
        .db_client
        .edit_message(message_id, body.message)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    broadcast_ticket_update(&app_state, ticket_id).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn delete_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((ticket_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .db_client
        .get_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .filter(|m| m.ticket_id == ticket_id)
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    if message.sender_id != Some(auth.user.id) {
        return Err(HttpError::unauthorized(
            "Only the sender can delete this message",
        ));
    }

    let message = app_state
        .db_client
        .soft_delete_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    broadcast_ticket_update(&app_state, ticket_id).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn react_to_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((ticket_id, message_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ReactDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .db_client
        .toggle_message_reaction(ticket_id, message_id, body.emoji, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    broadcast_ticket_update(&app_state, ticket_id).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn archive_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<ArchiveTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let is_admin = auth.user.role.is_admin();

    // Each role controls exactly one archival flag; asking for the other
    // role's flag is an authorization error, not a fallthrough.
    if let Some(scope) = body.scope {
        let allowed = match scope {
            ArchiveScope::User => !is_admin,
            ArchiveScope::Admin => is_admin,
        };
        if !allowed {
            return Err(HttpError::unauthorized(
                ErrorMessage::PermissionDenied.to_string(),
            ));
        }
    }

    let ticket = app_state
        .db_client
        .get_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    if !is_admin && ticket.user_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to access this ticket",
        ));
    }

    let archived = body.archived.unwrap_or(true);

    let ticket = app_state
        .db_client
        .set_archived(ticket_id, is_admin, archived)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    let event = if is_admin {
        ServerEvent::TicketArchived {
            id: ticket_id,
            archived_by_user: None,
            archived_by_admin: Some(archived),
        }
    } else {
        ServerEvent::TicketArchived {
            id: ticket_id,
            archived_by_user: Some(archived),
            archived_by_admin: None,
        }
    };
    app_state.events.broadcast(event).await;

    // Team-wide archival moves tickets in and out of the unread counter.
    if is_admin {
        app_state.notifier.broadcast_counts().await;
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn hide_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let ticket = app_state
        .db_client
        .hide_for_admin(ticket_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn unhide_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let ticket = app_state
        .db_client
        .unhide_for_admin(ticket_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn close_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let ticket = app_state
        .db_client
        .close_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Ticket not found"))?;

    broadcast_ticket_update(&app_state, ticket_id).await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn delete_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::SuperAdmin {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let deleted = app_state
        .db_client
        .delete_ticket(ticket_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if deleted == 0 {
        return Err(HttpError::not_found("Ticket not found"));
    }

    app_state
        .events
        .broadcast(ServerEvent::TicketDeleted { id: ticket_id })
        .await;
    app_state.notifier.broadcast_counts().await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Ticket deleted"
    })))
}
