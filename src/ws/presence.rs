// src/ws/presence.rs
//
// Live mapping from a logical user id to its current socket endpoint.
// Process-local only: rebuilt empty on restart, so a unicast aimed at a user
// who reconnected elsewhere is silently dropped until they re-register.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    entries: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `user_id` to `endpoint_id`, replacing any previous endpoint.
    /// Last connection wins; there is no multi-device fan-out.
    pub async fn register(&self, user_id: Uuid, endpoint_id: Uuid) {
        let mut entries = self.entries.write().await;
        entries.insert(user_id, endpoint_id);
        tracing::debug!(user_id = %user_id, endpoint_id = %endpoint_id, "presence registered");
    }

    /// Removes the entry whose endpoint matches. A disconnect can race a
    /// connection that never registered, so a missing entry is a no-op.
    pub async fn unregister(&self, endpoint_id: Uuid) {
        let mut entries = self.entries.write().await;
        if let Some(user_id) = entries
            .iter()
            .find(|(_, ep)| **ep == endpoint_id)
            .map(|(user, _)| *user)
        {
            entries.remove(&user_id);
            tracing::debug!(user_id = %user_id, endpoint_id = %endpoint_id, "presence removed");
        }
    }

    pub async fn resolve(&self, user_id: Uuid) -> Option<Uuid> {
        let entries = self.entries.read().await;
        entries.get(&user_id).copied()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn online_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_overwrites_previous_endpoint() {
        let presence = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        presence.register(user, first).await;
        presence.register(user, second).await;

        assert_eq!(presence.resolve(user).await, Some(second));
        assert_eq!(presence.online_count().await, 1);
    }

    #[tokio::test]
    async fn resolve_after_unregister_is_absent() {
        let presence = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let endpoint = Uuid::new_v4();

        presence.register(user, endpoint).await;
        presence.unregister(endpoint).await;

        assert_eq!(presence.resolve(user).await, None);
    }

    #[tokio::test]
    async fn unregister_unknown_endpoint_is_noop() {
        let presence = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let endpoint = Uuid::new_v4();

        presence.register(user, endpoint).await;
        presence.unregister(Uuid::new_v4()).await;

        assert_eq!(presence.resolve(user).await, Some(endpoint));
    }

    #[tokio::test]
    async fn stale_endpoint_does_not_evict_new_connection() {
        let presence = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        presence.register(user, old).await;
        presence.register(user, new).await;
        // The old socket's disconnect fires after the reconnect.
        presence.unregister(old).await;

        assert_eq!(presence.resolve(user).await, Some(new));
    }
}
