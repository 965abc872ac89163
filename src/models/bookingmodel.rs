// src/models/bookingmodel.rs
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::Type;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Owner-side cancellation window: open until work starts.
    pub fn user_cancellable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// One line of the booking's audit timeline, appended on every status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingHistoryEntry {
    pub from: Option<BookingStatus>,
    pub to: BookingStatus,
    pub actor: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service: String,
    pub address: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: BookingStatus,
    pub is_read: bool,
    pub history: Json<Vec<BookingHistoryEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_cancellation_window_closes_once_work_starts() {
        assert!(BookingStatus::Pending.user_cancellable());
        assert!(BookingStatus::Confirmed.user_cancellable());
        assert!(!BookingStatus::InProgress.user_cancellable());
        assert!(!BookingStatus::Completed.user_cancellable());
        assert!(!BookingStatus::Cancelled.user_cancellable());
    }
}
