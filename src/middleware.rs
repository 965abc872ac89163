use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Extension,
};

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::userdb::UserExt,
    error::{ErrorMessage, HttpError},
    models::usermodel::{User, UserRole, UserStatus},
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let cookies = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    if auth_value.starts_with("Bearer ") {
                        Some(auth_value[7..].to_owned())
                    } else {
                        None
                    }
                })
        });

    let token = cookies
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let user_id = token::decode_token(token, app_state.env.jwt_secret.as_bytes())?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|_| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    let user = user
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    // Status is re-read from the store on every request, so a ban takes
    // effect here even when the client still holds an older valid token.
    ensure_active(user.status)?;

    req.extensions_mut().insert(JWTAuthMiddeware { user });

    Ok(next.run(req).await)
}

/// Gate shared by the REST middleware and the socket upgrade: suspended and
/// banned accounts get no authenticated surface, push channel included.
pub fn ensure_active(status: UserStatus) -> Result<(), HttpError> {
    match status {
        UserStatus::Banned => Err(HttpError::forbidden(ErrorMessage::AccountBanned.to_string())),
        UserStatus::Suspended => Err(HttpError::forbidden(
            ErrorMessage::AccountSuspended.to_string(),
        )),
        UserStatus::Active => Ok(()),
    }
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req.extensions().get::<JWTAuthMiddeware>().ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string())
    })?;

    if !required_roles.contains(&user.user.role) {
        return Err(HttpError::new(
            ErrorMessage::PermissionDenied.to_string(),
            StatusCode::FORBIDDEN,
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspended_and_banned_accounts_are_refused() {
        assert_eq!(
            ensure_active(UserStatus::Banned).unwrap_err().status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ensure_active(UserStatus::Suspended).unwrap_err().status,
            StatusCode::FORBIDDEN
        );
        assert!(ensure_active(UserStatus::Active).is_ok());
    }
}
