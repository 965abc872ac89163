// src/db/ticketdb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ticketmodel::*;

#[async_trait]
pub trait TicketExt {
    /// Creates a ticket and its first message in one transaction.
    async fn create_ticket(
        &self,
        user_id: Uuid,
        subject: String,
        text: String,
        attachments: Vec<Attachment>,
    ) -> Result<Ticket, Error>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;

    /// Ticket with owner/assignee names and the full message thread joined.
    async fn get_ticket_populated(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<TicketWithMessages>, Error>;

    /// Admin listing. Excludes tickets the caller has hidden for themselves;
    /// `archived` selects the archived view instead of the default one.
    async fn get_tickets(
        &self,
        admin_id: Uuid,
        archived: bool,
    ) -> Result<Vec<TicketWithUser>, Error>;

    async fn get_user_tickets(
        &self,
        user_id: Uuid,
        archived: bool,
    ) -> Result<Vec<Ticket>, Error>;

    /// Appends a message and applies the status transition: admin messages
    /// flip the ticket to awaiting_reply and clear the owner's read flag;
    /// user/bot messages re-open it and empty the admin read-set.
    async fn append_message(
        &self,
        ticket_id: Uuid,
        sender_id: Option<Uuid>,
        sender_type: SenderType,
        text: String,
        attachments: Vec<Attachment>,
    ) -> Result<TicketMessage, Error>;

    /// Conditional claim. A plain admin only wins when the ticket is still
    /// unclaimed; `reclaim` (superAdmin) takes it regardless. Returns None
    /// when the predicate fails, which concurrent losers observe as a
    /// conflict.
    async fn claim_ticket(
        &self,
        ticket_id: Uuid,
        admin_id: Uuid,
        reclaim: bool,
    ) -> Result<Option<Ticket>, Error>;

    /// Adds the admin to the read-set. Safe to repeat: the guarded
    /// append is a no-op when the admin is already present.
    async fn mark_read_admin(&self, ticket_id: Uuid, admin_id: Uuid)
        -> Result<Option<Ticket>, Error>;

    async fn mark_read_user(&self, ticket_id: Uuid, user_id: Uuid)
        -> Result<Option<Ticket>, Error>;

    async fn get_message(&self, message_id: Uuid) -> Result<Option<TicketMessage>, Error>;

    async fn edit_message(&self, message_id: Uuid, text: String)
        -> Result<Option<TicketMessage>, Error>;

    /// Soft delete: text and attachments are cleared but the row keeps its
    /// id, sender and timestamp so the thread shape survives.
    async fn soft_delete_message(&self, message_id: Uuid)
        -> Result<Option<TicketMessage>, Error>;

    /// Toggles `user_id` on the emoji's reaction set. The row is locked for
    /// the duration of the toggle so concurrent reactions serialize instead
    /// of overwriting each other.
    async fn toggle_message_reaction(
        &self,
        ticket_id: Uuid,
        message_id: Uuid,
        emoji: String,
        user_id: Uuid,
    ) -> Result<Option<TicketMessage>, Error>;

    async fn set_archived(
        &self,
        ticket_id: Uuid,
        for_admin: bool,
        archived: bool,
    ) -> Result<Option<Ticket>, Error>;

    async fn hide_for_admin(&self, ticket_id: Uuid, admin_id: Uuid)
        -> Result<Option<Ticket>, Error>;

    async fn unhide_for_admin(&self, ticket_id: Uuid, admin_id: Uuid)
        -> Result<Option<Ticket>, Error>;

    async fn close_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error>;

    /// Tickets no admin has acknowledged yet (and not team-archived).
    async fn count_unread_by_admin(&self) -> Result<i64, Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn create_ticket(
        &self,
        user_id: Uuid,
        subject: String,
        text: String,
        attachments: Vec<Attachment>,
    ) -> Result<Ticket, Error> {
        let mut tx = self.pool.begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (user_id, subject)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender_id, sender_type, text, attachments)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(ticket.id)
        .bind(user_id)
        .bind(SenderType::User)
        .bind(text)
        .bind(Json(attachments))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn get_ticket_populated(
        &self,
        ticket_id: Uuid,
    ) -> Result<Option<TicketWithMessages>, Error> {
        let ticket = sqlx::query_as::<_, TicketWithUser>(
            r#"
            SELECT
                t.*,
                u.name AS user_name,
                u.email AS user_email,
                a.name AS assigned_admin_name
            FROM tickets t
            JOIN users u ON t.user_id = u.id
            LEFT JOIN users a ON t.assigned_admin = a.id
            WHERE t.id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(ticket) = ticket else {
            return Ok(None);
        };

        let messages = sqlx::query_as::<_, TicketMessageWithSender>(
            r#"
            SELECT
                m.*,
                u.name AS sender_name
            FROM ticket_messages m
            LEFT JOIN users u ON m.sender_id = u.id
            WHERE m.ticket_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TicketWithMessages { ticket, messages }))
    }

    async fn get_tickets(
        &self,
        admin_id: Uuid,
        archived: bool,
    ) -> Result<Vec<TicketWithUser>, Error> {
        let tickets = sqlx::query_as::<_, TicketWithUser>(
            r#"
            SELECT
                t.*,
                u.name AS user_name,
                u.email AS user_email,
                a.name AS assigned_admin_name
            FROM tickets t
            JOIN users u ON t.user_id = u.id
            LEFT JOIN users a ON t.assigned_admin = a.id
            WHERE t.archived_by_admin = $2
              AND NOT ($1 = ANY(t.hidden_for_admins))
            ORDER BY t.updated_at DESC
            "#,
        )
        .bind(admin_id)
        .bind(archived)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn get_user_tickets(
        &self,
        user_id: Uuid,
        archived: bool,
    ) -> Result<Vec<Ticket>, Error> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM tickets
            WHERE user_id = $1 AND archived_by_user = $2
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(archived)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn append_message(
        &self,
        ticket_id: Uuid,
        sender_id: Option<Uuid>,
        sender_type: SenderType,
        text: String,
        attachments: Vec<Attachment>,
    ) -> Result<TicketMessage, Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender_id, sender_type, text, attachments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(sender_id)
        .bind(sender_type)
        .bind(text)
        .bind(Json(attachments))
        .fetch_one(&mut *tx)
        .await?;

        let status = status_after_message(sender_type);
        match sender_type {
            SenderType::Admin => {
                sqlx::query(
                    r#"
                    UPDATE tickets
                    SET status = $1, user_read = FALSE, updated_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(status)
                .bind(ticket_id)
                .execute(&mut *tx)
                .await?;
            }
            SenderType::User | SenderType::Bot => {
                sqlx::query(
                    r#"
                    UPDATE tickets
                    SET status = $1, admin_read_by = '{}', updated_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(status)
                .bind(ticket_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(message)
    }

    async fn claim_ticket(
        &self,
        ticket_id: Uuid,
        admin_id: Uuid,
        reclaim: bool,
    ) -> Result<Option<Ticket>, Error> {
        // The claiming admin joins the read-set in the same atomic update.
        let query = if reclaim {
            r#"
            UPDATE tickets
            SET assigned_admin = $2,
                status = 'claimed',
                admin_read_by = CASE
                    WHEN $2 = ANY(admin_read_by) THEN admin_read_by
                    ELSE array_append(admin_read_by, $2)
                END,
                updated_at = NOW()
            WHERE id = $1 AND status <> 'closed'
            RETURNING *
            "#
        } else {
            r#"
            UPDATE tickets
            SET assigned_admin = $2,
                status = 'claimed',
                admin_read_by = CASE
                    WHEN $2 = ANY(admin_read_by) THEN admin_read_by
                    ELSE array_append(admin_read_by, $2)
                END,
                updated_at = NOW()
            WHERE id = $1 AND assigned_admin IS NULL AND status <> 'closed'
            RETURNING *
            "#
        };

        let ticket = sqlx::query_as::<_, Ticket>(query)
            .bind(ticket_id)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn mark_read_admin(
        &self,
        ticket_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Ticket>, Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET admin_read_by = array_append(admin_read_by, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(admin_read_by))
            "#,
        )
        .bind(ticket_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE ticket_messages
            SET read_by = array_append(read_by, $2)
            WHERE ticket_id = $1 AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(ticket_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        self.get_ticket(ticket_id).await
    }

    async fn mark_read_user(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Ticket>, Error> {
        let mut tx = self.pool.begin().await?;

        // Ownership gate goes first: when the caller does not own the
        // ticket, nothing else in the transaction has run yet.
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET user_read = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = ticket else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE ticket_messages
            SET read_by = array_append(read_by, $2)
            WHERE ticket_id = $1 AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ticket))
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<TicketMessage>, Error> {
        let message =
            sqlx::query_as::<_, TicketMessage>("SELECT * FROM ticket_messages WHERE id = $1")
                .bind(message_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(message)
    }

    async fn edit_message(
        &self,
        message_id: Uuid,
        text: String,
    ) -> Result<Option<TicketMessage>, Error> {
        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            UPDATE ticket_messages
            SET text = $2, is_edited = TRUE
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(message_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn soft_delete_message(
        &self,
        message_id: Uuid,
    ) -> Result<Option<TicketMessage>, Error> {
        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            UPDATE ticket_messages
            SET text = '', attachments = '[]'::jsonb, is_deleted = TRUE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn toggle_message_reaction(
        &self,
        ticket_id: Uuid,
        message_id: Uuid,
        emoji: String,
        user_id: Uuid,
    ) -> Result<Option<TicketMessage>, Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            SELECT * FROM ticket_messages
            WHERE id = $1 AND ticket_id = $2 AND is_deleted = FALSE
            FOR UPDATE
            "#,
        )
        .bind(message_id)
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(message) = message else {
            return Ok(None);
        };

        let mut reactions = message.reactions.0;
        toggle_reaction(&mut reactions, &emoji, user_id);

        let message = sqlx::query_as::<_, TicketMessage>(
            r#"
            UPDATE ticket_messages
            SET reactions = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(message_id)
        .bind(Json(reactions))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(message))
    }

    async fn set_archived(
        &self,
        ticket_id: Uuid,
        for_admin: bool,
        archived: bool,
    ) -> Result<Option<Ticket>, Error> {
        let query = if for_admin {
            r#"
            UPDATE tickets
            SET archived_by_admin = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        } else {
            r#"
            UPDATE tickets
            SET archived_by_user = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        };

        let ticket = sqlx::query_as::<_, Ticket>(query)
            .bind(ticket_id)
            .bind(archived)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn hide_for_admin(
        &self,
        ticket_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Ticket>, Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET hidden_for_admins = array_append(hidden_for_admins, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(hidden_for_admins))
            "#,
        )
        .bind(ticket_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        self.get_ticket(ticket_id).await
    }

    async fn unhide_for_admin(
        &self,
        ticket_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET hidden_for_admins = array_remove(hidden_for_admins, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn close_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET status = 'closed', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread_by_admin(&self) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tickets
            WHERE cardinality(admin_read_by) = 0
              AND archived_by_admin = FALSE
              AND status <> 'closed'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
