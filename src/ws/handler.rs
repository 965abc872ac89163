// src/ws/handler.rs
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    db::userdb::UserExt,
    error::{ErrorMessage, HttpError},
    middleware::ensure_active,
    models::usermodel::User,
    utils::token,
    AppState,
};

use super::events::ServerEvent;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Upgrades to a WebSocket after validating the credential carried in the
/// query string. The authenticated identity doubles as the `addUser`
/// handshake: presence is registered as soon as the socket opens.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<Response, HttpError> {
    let user_id = token::decode_token(query.token, app_state.env.jwt_secret.as_bytes())?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    ensure_active(user.status)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, app_state)))
}

async fn handle_socket(socket: WebSocket, user: User, app_state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let endpoint_id = Uuid::new_v4();
    app_state.events.connect(endpoint_id, user.role, tx).await;
    app_state.presence.register(user.id, endpoint_id).await;

    // Outbound pump: drains queued events into the socket until the client
    // goes away or the channel closes.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sink.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "failed to serialize socket event");
                }
            }
        }
    });

    // The channel is push-only; clients reconcile missed state over REST on
    // reconnect, so inbound frames other than Close are ignored.
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
            _ => {}
        }
    }

    tracing::info!(endpoint_id = %endpoint_id, user_id = %user.id, "socket connection closing");
    app_state.presence.unregister(endpoint_id).await;
    app_state.events.disconnect(endpoint_id).await;
    send_task.abort();
}
