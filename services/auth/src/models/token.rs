//! Persisted token model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Token entity: one row per issued access or refresh token
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Token {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub is_refresh: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// New token creation payload
#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: Uuid,
    pub token: String,
    pub is_refresh: bool,
    pub expires_at: DateTime<Utc>,
}
