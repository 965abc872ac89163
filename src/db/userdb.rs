// src/db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{MaintenancePage, User, UserRole, UserStatus};

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: Option<Uuid>, email: Option<&str>)
        -> Result<Option<User>, Error>;

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error>;

    async fn save_user(&self, name: String, email: String) -> Result<User, Error>;

    async fn update_user_role(&self, user_id: Uuid, role: UserRole)
        -> Result<Option<User>, Error>;

    async fn update_user_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, Error>;

    async fn dismiss_new_user(&self, user_id: Uuid) -> Result<Option<User>, Error>;

    async fn count_new_users(&self) -> Result<i64, Error>;

    async fn set_maintenance(&self, page: String, enabled: bool)
        -> Result<MaintenancePage, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let user = match (user_id, email) {
            (Some(id), _) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            (_, Some(email)) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?
            }
            _ => None,
        };

        Ok(user)
    }

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn save_user(&self, name: String, email: String) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_role(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(role)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn dismiss_new_user(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_new = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn count_new_users(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_new = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn set_maintenance(
        &self,
        page: String,
        enabled: bool,
    ) -> Result<MaintenancePage, Error> {
        let record = sqlx::query_as::<_, MaintenancePage>(
            r#"
            INSERT INTO maintenance_pages (page, enabled, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (page) DO UPDATE SET
                enabled = $2,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(page)
        .bind(enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
