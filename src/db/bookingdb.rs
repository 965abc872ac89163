// src/db/bookingdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::bookingmodel::*;

#[async_trait]
pub trait BookingExt {
    async fn create_booking(
        &self,
        user_id: Uuid,
        service: String,
        address: String,
        scheduled_for: DateTime<Utc>,
    ) -> Result<Booking, Error>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, Error>;

    async fn get_bookings(&self, limit: i64, offset: i64) -> Result<Vec<Booking>, Error>;

    async fn get_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, Error>;

    /// Transitions the booking and appends the change to its audit timeline.
    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Uuid,
    ) -> Result<Option<Booking>, Error>;

    async fn mark_booking_read(&self, booking_id: Uuid) -> Result<Option<Booking>, Error>;

    async fn delete_booking(&self, booking_id: Uuid) -> Result<u64, Error>;

    async fn count_pending_bookings(&self) -> Result<i64, Error>;
}

#[async_trait]
impl BookingExt for DBClient {
    async fn create_booking(
        &self,
        user_id: Uuid,
        service: String,
        address: String,
        scheduled_for: DateTime<Utc>,
    ) -> Result<Booking, Error> {
        let seed = vec![BookingHistoryEntry {
            from: None,
            to: BookingStatus::Pending,
            actor: user_id,
            at: Utc::now(),
        }];

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (user_id, service, address, scheduled_for, history)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(service)
        .bind(address)
        .bind(scheduled_for)
        .bind(Json(seed))
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, Error> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn get_bookings(&self, limit: i64, offset: i64) -> Result<Vec<Booking>, Error> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn get_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, Error> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Uuid,
    ) -> Result<Option<Booking>, Error> {
        let Some(current) = self.get_booking(booking_id).await? else {
            return Ok(None);
        };

        let entry = BookingHistoryEntry {
            from: Some(current.status),
            to: status,
            actor,
            at: Utc::now(),
        };

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2,
                history = history || $3::jsonb,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .bind(Json(vec![entry]))
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn mark_booking_read(&self, booking_id: Uuid) -> Result<Option<Booking>, Error> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET is_read = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn delete_booking(&self, booking_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_pending_bookings(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
