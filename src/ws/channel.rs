// src/ws/channel.rs
//
// Fire-and-forget delivery to connected sockets. Every endpoint gets its own
// unbounded sender, so a slow or dead client never blocks a broadcast for the
// others; failed sends are dropped and the client reconciles over REST.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::ServerEvent;
use crate::models::usermodel::UserRole;

#[derive(Debug)]
struct Endpoint {
    role: UserRole,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct EventChannel {
    endpoints: Arc<RwLock<HashMap<Uuid, Endpoint>>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(
        &self,
        endpoint_id: Uuid,
        role: UserRole,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let mut endpoints = self.endpoints.write().await;
        endpoints.insert(endpoint_id, Endpoint { role, sender });
        tracing::info!(
            endpoint_id = %endpoint_id,
            role = role.to_str(),
            total_connections = endpoints.len(),
            "socket endpoint connected"
        );
    }

    pub async fn disconnect(&self, endpoint_id: Uuid) {
        let mut endpoints = self.endpoints.write().await;
        if endpoints.remove(&endpoint_id).is_some() {
            tracing::info!(
                endpoint_id = %endpoint_id,
                remaining_connections = endpoints.len(),
                "socket endpoint disconnected"
            );
        }
    }

    /// Delivers `event` to every connected endpoint.
    pub async fn broadcast(&self, event: ServerEvent) {
        let endpoints = self.endpoints.read().await;
        for endpoint in endpoints.values() {
            let _ = endpoint.sender.send(event.clone());
        }
    }

    /// Delivers `event` to admin and superAdmin endpoints only. Used for the
    /// back-office count badge so plain users never see admin totals.
    pub async fn broadcast_admins(&self, event: ServerEvent) {
        let endpoints = self.endpoints.read().await;
        for endpoint in endpoints.values() {
            if endpoint.role.is_admin() {
                let _ = endpoint.sender.send(event.clone());
            }
        }
    }

    /// Delivers `event` to exactly one endpoint. Returns false when the
    /// endpoint is gone or its receiver has been dropped.
    pub async fn unicast(&self, endpoint_id: Uuid, event: ServerEvent) -> bool {
        let endpoints = self.endpoints.read().await;
        match endpoints.get(&endpoint_id) {
            Some(endpoint) => endpoint.sender.send(event).is_ok(),
            None => false,
        }
    }

    pub async fn connection_count(&self) -> usize {
        let endpoints = self.endpoints.read().await;
        endpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(message: &str) -> ServerEvent {
        ServerEvent::UserReceiveWarning {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_endpoint() {
        let channel = EventChannel::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        channel.connect(Uuid::new_v4(), UserRole::User, tx1).await;
        channel.connect(Uuid::new_v4(), UserRole::Admin, tx2).await;

        channel.broadcast(warning("hello")).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn admin_broadcast_skips_plain_users() {
        let channel = EventChannel::new();
        let (user_tx, mut user_rx) = mpsc::unbounded_channel();
        let (admin_tx, mut admin_rx) = mpsc::unbounded_channel();

        channel.connect(Uuid::new_v4(), UserRole::User, user_tx).await;
        channel
            .connect(Uuid::new_v4(), UserRole::SuperAdmin, admin_tx)
            .await;

        channel.broadcast_admins(warning("counts")).await;

        assert!(user_rx.try_recv().is_err());
        assert!(admin_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unicast_targets_exactly_one_endpoint() {
        let channel = EventChannel::new();
        let target = Uuid::new_v4();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        channel.connect(target, UserRole::User, tx1).await;
        channel.connect(Uuid::new_v4(), UserRole::User, tx2).await;

        assert!(channel.unicast(target, warning("only you")).await);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn unicast_to_unknown_endpoint_reports_failure() {
        let channel = EventChannel::new();
        assert!(!channel.unicast(Uuid::new_v4(), warning("ghost")).await);
    }

    #[tokio::test]
    async fn dead_receiver_does_not_poison_broadcast() {
        let channel = EventChannel::new();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();

        channel.connect(Uuid::new_v4(), UserRole::User, dead_tx).await;
        channel.connect(Uuid::new_v4(), UserRole::User, live_tx).await;

        channel.broadcast(warning("still here")).await;

        assert!(live_rx.try_recv().is_ok());
    }
}
