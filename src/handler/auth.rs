// src/handler/auth.rs
use std::sync::Arc;
use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use serde::Deserialize;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    error::HttpError,
    utils::token,
    ws::events::ServerEvent,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

pub fn auth_handler() -> Router {
    Router::new().route("/register", post(register))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .is_some()
    {
        return Err(HttpError::bad_request("Email already registered"));
    }

    let user = app_state
        .db_client
        .save_user(body.name, body.email)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let token = token::create_token(
        &user,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage * 60,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to build auth cookie"))?,
    );

    app_state.events.broadcast(ServerEvent::UserListUpdated).await;
    app_state.notifier.broadcast_counts().await;

    let response = Json(serde_json::json!({
        "status": "success",
        "data": { "user": user, "token": token }
    }));

    Ok((headers, response))
}
