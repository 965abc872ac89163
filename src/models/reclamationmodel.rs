// src/models/reclamationmodel.rs
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq)]
#[sqlx(type_name = "reclamation_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum ReclamationStatus {
    Pending,
    Handled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reclamation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub subject: String,
    pub description: String,
    pub status: ReclamationStatus,
    pub admin_read_by: Vec<Uuid>,
    pub hidden_for_admins: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
