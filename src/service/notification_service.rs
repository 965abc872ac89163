// src/service/notification_service.rs
use std::sync::Arc;

use crate::{
    db::{
        bookingdb::BookingExt, db::DBClient, reclamationdb::ReclamationExt,
        ticketdb::TicketExt, userdb::UserExt,
    },
    ws::{
        channel::EventChannel,
        events::{NotificationCounts, ServerEvent},
    },
};

/// Recomputes the admin console's pending-work counters and pushes them to
/// connected admin endpoints. Counts are derived on demand from the store,
/// never cached: a missed broadcast costs a stale badge until the next
/// trigger, nothing more.
#[derive(Debug, Clone)]
pub struct Notifier {
    db_client: Arc<DBClient>,
    events: EventChannel,
}

impl Notifier {
    pub fn new(db_client: Arc<DBClient>, events: EventChannel) -> Self {
        Self { db_client, events }
    }

    pub async fn compute_counts(&self) -> Result<NotificationCounts, sqlx::Error> {
        let users = self.db_client.count_new_users().await?;
        let tickets = self.db_client.count_unread_by_admin().await?;
        let bookings = self.db_client.count_pending_bookings().await?;
        let reclamations = self.db_client.count_unread_reclamations().await?;

        Ok(NotificationCounts {
            users,
            tickets,
            bookings,
            reclamations,
        })
    }

    /// Best-effort: a failed recompute is logged and swallowed so it can
    /// never fail the mutation that triggered it.
    pub async fn broadcast_counts(&self) {
        match self.compute_counts().await {
            Ok(counts) => {
                self.events
                    .broadcast_admins(ServerEvent::NotificationCountsUpdated(counts))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to recompute notification counts");
            }
        }
    }
}
