//! Token repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;

use crate::models::{NewToken, Token};

/// Persisted record of every issued token string
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, new_token: &NewToken) -> DatabaseResult<Token>;

    /// Whether this exact token string was issued and not yet removed
    async fn exists(&self, token: &str) -> DatabaseResult<bool>;

    /// Remove a token; returns whether a row was deleted
    async fn delete(&self, token: &str) -> DatabaseResult<bool>;

    /// Remove every token that expired at or before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64>;
}

/// PostgreSQL-backed token repository
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn insert(&self, new_token: &NewToken) -> DatabaseResult<Token> {
        sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (user_id, token, is_refresh, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token, is_refresh, expires_at, created_at
            "#,
        )
        .bind(new_token.user_id)
        .bind(&new_token.token)
        .bind(new_token.is_refresh)
        .bind(new_token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn exists(&self, token: &str) -> DatabaseResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        info!("Purged {} expired tokens", result.rows_affected());
        Ok(result.rows_affected())
    }
}
