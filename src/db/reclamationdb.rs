// src/db/reclamationdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::reclamationmodel::*;

#[async_trait]
pub trait ReclamationExt {
    async fn create_reclamation(
        &self,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        subject: String,
        description: String,
    ) -> Result<Reclamation, Error>;

    async fn get_reclamation(&self, reclamation_id: Uuid)
        -> Result<Option<Reclamation>, Error>;

    /// Admin listing, minus the entries the caller has masked for themselves.
    async fn get_reclamations(&self, admin_id: Uuid) -> Result<Vec<Reclamation>, Error>;

    async fn get_user_reclamations(&self, user_id: Uuid) -> Result<Vec<Reclamation>, Error>;

    async fn mark_reclamation_read(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error>;

    async fn hide_reclamation(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error>;

    async fn unhide_reclamation(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error>;

    async fn handle_reclamation(
        &self,
        reclamation_id: Uuid,
    ) -> Result<Option<Reclamation>, Error>;

    async fn count_unread_reclamations(&self) -> Result<i64, Error>;
}

#[async_trait]
impl ReclamationExt for DBClient {
    async fn create_reclamation(
        &self,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        subject: String,
        description: String,
    ) -> Result<Reclamation, Error> {
        let reclamation = sqlx::query_as::<_, Reclamation>(
            r#"
            INSERT INTO reclamations (user_id, booking_id, subject, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(booking_id)
        .bind(subject)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(reclamation)
    }

    async fn get_reclamation(
        &self,
        reclamation_id: Uuid,
    ) -> Result<Option<Reclamation>, Error> {
        let reclamation =
            sqlx::query_as::<_, Reclamation>("SELECT * FROM reclamations WHERE id = $1")
                .bind(reclamation_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(reclamation)
    }

    async fn get_reclamations(&self, admin_id: Uuid) -> Result<Vec<Reclamation>, Error> {
        let reclamations = sqlx::query_as::<_, Reclamation>(
            r#"
            SELECT * FROM reclamations
            WHERE NOT ($1 = ANY(hidden_for_admins))
            ORDER BY created_at DESC
            "#,
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reclamations)
    }

    async fn get_user_reclamations(&self, user_id: Uuid) -> Result<Vec<Reclamation>, Error> {
        let reclamations = sqlx::query_as::<_, Reclamation>(
            r#"
            SELECT * FROM reclamations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reclamations)
    }

    async fn mark_reclamation_read(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error> {
        sqlx::query(
            r#"
            UPDATE reclamations
            SET admin_read_by = array_append(admin_read_by, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(admin_read_by))
            "#,
        )
        .bind(reclamation_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        self.get_reclamation(reclamation_id).await
    }

    async fn hide_reclamation(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error> {
        sqlx::query(
            r#"
            UPDATE reclamations
            SET hidden_for_admins = array_append(hidden_for_admins, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(hidden_for_admins))
            "#,
        )
        .bind(reclamation_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        self.get_reclamation(reclamation_id).await
    }

    async fn unhide_reclamation(
        &self,
        reclamation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Reclamation>, Error> {
        let reclamation = sqlx::query_as::<_, Reclamation>(
            r#"
            UPDATE reclamations
            SET hidden_for_admins = array_remove(hidden_for_admins, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reclamation_id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reclamation)
    }

    async fn handle_reclamation(
        &self,
        reclamation_id: Uuid,
    ) -> Result<Option<Reclamation>, Error> {
        let reclamation = sqlx::query_as::<_, Reclamation>(
            r#"
            UPDATE reclamations
            SET status = 'handled', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reclamation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reclamation)
    }

    async fn count_unread_reclamations(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reclamations
            WHERE cardinality(admin_read_by) = 0 AND status = 'pending'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
