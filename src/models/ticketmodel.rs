// src/models/ticketmodel.rs
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::Type;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum TicketStatus {
    Open,
    AwaitingReply,
    Claimed,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq)]
#[sqlx(type_name = "sender_type", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum SenderType {
    User,
    Admin,
    Bot,
}

/// Status a ticket moves to when a message lands.
///
/// An admin reply moves the ball to the user's court (AwaitingReply); a user
/// or bot message re-opens the ticket for the whole admin team. The claim
/// assignment is never touched by this transition.
pub fn status_after_message(sender_type: SenderType) -> TicketStatus {
    match sender_type {
        SenderType::Admin => TicketStatus::AwaitingReply,
        SenderType::User | SenderType::Bot => TicketStatus::Open,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub mimetype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub emoji: String,
    pub users: Vec<Uuid>,
}

/// Toggles `user_id` in the reaction set for `emoji`.
///
/// Removing the last user drops the reaction entry entirely, so toggling
/// twice returns the list to its pre-reaction state.
pub fn toggle_reaction(reactions: &mut Vec<Reaction>, emoji: &str, user_id: Uuid) {
    if let Some(pos) = reactions.iter().position(|r| r.emoji == emoji) {
        let reaction = &mut reactions[pos];
        if let Some(idx) = reaction.users.iter().position(|u| *u == user_id) {
            reaction.users.remove(idx);
            if reaction.users.is_empty() {
                reactions.remove(pos);
            }
        } else {
            reaction.users.push(user_id);
        }
    } else {
        reactions.push(Reaction {
            emoji: emoji.to_string(),
            users: vec![user_id],
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub status: TicketStatus,
    pub assigned_admin: Option<Uuid>,
    pub user_read: bool,
    pub admin_read_by: Vec<Uuid>,
    pub archived_by_user: bool,
    pub archived_by_admin: bool,
    pub hidden_for_admins: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub sender_type: SenderType,
    pub text: String,
    pub attachments: Json<Vec<Attachment>>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub reactions: Json<Vec<Reaction>>,
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketWithUser {
    #[sqlx(flatten)]
    pub ticket: Ticket,
    pub user_name: String,
    pub user_email: String,
    pub assigned_admin_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketMessageWithSender {
    #[sqlx(flatten)]
    pub message: TicketMessage,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketWithMessages {
    pub ticket: TicketWithUser,
    pub messages: Vec<TicketMessageWithSender>,
}

#[derive(Debug, Deserialize)]
pub struct TicketQueryParams {
    pub archived: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_message_awaits_user_reply() {
        assert_eq!(
            status_after_message(SenderType::Admin),
            TicketStatus::AwaitingReply
        );
    }

    #[test]
    fn user_and_bot_messages_reopen_ticket() {
        assert_eq!(status_after_message(SenderType::User), TicketStatus::Open);
        assert_eq!(status_after_message(SenderType::Bot), TicketStatus::Open);
    }

    #[test]
    fn reaction_toggle_twice_restores_initial_state() {
        let mut reactions = Vec::new();
        let user = Uuid::new_v4();

        toggle_reaction(&mut reactions, "👍", user);
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].users, vec![user]);

        toggle_reaction(&mut reactions, "👍", user);
        assert!(reactions.is_empty());
    }

    #[test]
    fn distinct_emojis_coexist() {
        let mut reactions = Vec::new();
        let user = Uuid::new_v4();

        toggle_reaction(&mut reactions, "👍", user);
        toggle_reaction(&mut reactions, "🎉", user);

        assert_eq!(reactions.len(), 2);
        assert!(reactions.iter().any(|r| r.emoji == "👍"));
        assert!(reactions.iter().any(|r| r.emoji == "🎉"));
    }

    #[test]
    fn toggles_by_distinct_users_commute() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let mut one_order = Vec::new();
        toggle_reaction(&mut one_order, "👍", first);
        toggle_reaction(&mut one_order, "👍", second);

        let mut other_order = Vec::new();
        toggle_reaction(&mut other_order, "👍", second);
        toggle_reaction(&mut other_order, "👍", first);

        assert_eq!(one_order.len(), 1);
        assert_eq!(other_order.len(), 1);

        let mut users_one: Vec<Uuid> = one_order[0].users.clone();
        let mut users_other: Vec<Uuid> = other_order[0].users.clone();
        users_one.sort();
        users_other.sort();
        assert_eq!(users_one, users_other);
    }

    #[test]
    fn removing_one_user_keeps_reaction_for_others() {
        let mut reactions = Vec::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        toggle_reaction(&mut reactions, "👍", first);
        toggle_reaction(&mut reactions, "👍", second);
        toggle_reaction(&mut reactions, "👍", first);

        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].users, vec![second]);
    }
}
