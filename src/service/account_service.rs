// src/service/account_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, userdb::UserExt},
    models::usermodel::{User, UserRole, UserStatus},
    service::error::ServiceError,
    utils::token,
    ws::{channel::EventChannel, events::ServerEvent, presence::PresenceRegistry},
};

/// Applies role/status changes and propagates them live. The affected user
/// gets a freshly minted credential pushed over their socket when one is
/// connected; otherwise the change simply takes effect the next time the
/// auth middleware reloads their row. The superseded token stays valid
/// until its own expiry (accepted soft-transition window).
#[derive(Debug, Clone)]
pub struct AccountService {
    db_client: Arc<DBClient>,
    events: EventChannel,
    presence: PresenceRegistry,
    jwt_secret: String,
    jwt_maxage: i64,
}

impl AccountService {
    pub fn new(
        db_client: Arc<DBClient>,
        events: EventChannel,
        presence: PresenceRegistry,
        jwt_secret: String,
        jwt_maxage: i64,
    ) -> Self {
        Self {
            db_client,
            events,
            presence,
            jwt_secret,
            jwt_maxage,
        }
    }

    fn mint_token(&self, user: &User) -> Result<String, ServiceError> {
        Ok(token::create_token(
            user,
            self.jwt_secret.as_bytes(),
            self.jwt_maxage * 60,
        )?)
    }

    pub async fn change_role(&self, user_id: Uuid, role: UserRole) -> Result<User, ServiceError> {
        let user = self
            .db_client
            .update_user_role(user_id, role)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let new_token = self.mint_token(&user)?;

        if let Some(endpoint_id) = self.presence.resolve(user.id).await {
            self.events
                .unicast(
                    endpoint_id,
                    ServerEvent::UserUpdated {
                        user: user.clone(),
                        new_token,
                    },
                )
                .await;
        }

        self.events.broadcast(ServerEvent::UserListUpdated).await;

        Ok(user)
    }

    pub async fn change_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, ServiceError> {
        let user = self
            .db_client
            .update_user_status(user_id, status)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let fresh_token = self.mint_token(&user)?;

        if let Some(endpoint_id) = self.presence.resolve(user.id).await {
            let event = match status {
                UserStatus::Suspended | UserStatus::Banned => ServerEvent::ForceBan {
                    banned_token: fresh_token,
                },
                UserStatus::Active => ServerEvent::AccountReactivated {
                    new_token: fresh_token,
                },
            };
            self.events.unicast(endpoint_id, event).await;
        }

        self.events.broadcast(ServerEvent::UserListUpdated).await;

        Ok(user)
    }

    /// Pushes a warning at the user's live endpoint. Returns whether a
    /// connected endpoint received it.
    pub async fn warn(&self, user_id: Uuid, message: String) -> bool {
        match self.presence.resolve(user_id).await {
            Some(endpoint_id) => {
                self.events
                    .unicast(endpoint_id, ServerEvent::UserReceiveWarning { message })
                    .await
            }
            None => false,
        }
    }
}
