//! Token issuance and validation
//!
//! A token is valid only when its signature verifies, the exact string is
//! present in the token store, and its `exp` lies in the future. Checks
//! run in that order and each failure has its own [`TokenError`] kind.

use chrono::{DateTime, Utc};
use common::error::DatabaseError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    jwt::{Claims, JwtService, TokenKind},
    models::{NewToken, User},
    repositories::TokenStore,
};

/// Reasons a token is refused, plus infrastructure failures
#[derive(Debug, Error)]
pub enum TokenError {
    /// Tampered, malformed, or signed with another algorithm
    #[error("invalid token signature")]
    InvalidSignature,

    /// Well-formed but never issued here, or already revoked
    #[error("token is not known")]
    UnknownToken,

    #[error("token has expired")]
    Expired,

    /// Issuance time plus lifetime is not a representable timestamp
    #[error("token expiry out of range")]
    ExpiryOutOfRange,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl TokenError {
    /// Whether the error says something about the token rather than about
    /// the service
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidSignature | TokenError::UnknownToken | TokenError::Expired
        )
    }
}

/// Issues and validates persisted tokens
#[derive(Clone)]
pub struct TokenService {
    jwt: JwtService,
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(jwt: JwtService, store: Arc<dyn TokenStore>) -> Self {
        Self { jwt, store }
    }

    /// Sign a new token for `user` and record it in the store
    pub async fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(user, kind, Utc::now()).await
    }

    pub(crate) async fn issue_at(
        &self,
        user: &User,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.jwt.lifetime(kind))
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = Claims {
            login: user.login.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            is_refresh: kind.is_refresh(),
            jti: Uuid::new_v4(),
        };
        let token = self.jwt.encode(&claims).map_err(TokenError::Signing)?;

        self.store
            .insert(&NewToken {
                user_id: user.id,
                token: token.clone(),
                is_refresh: kind.is_refresh(),
                expires_at,
            })
            .await?;

        debug!("Issued {:?} token for user {}", kind, user.login);
        Ok(token)
    }

    /// Validate a token string and return its claims
    pub async fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now()).await
    }

    async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self
            .jwt
            .decode(token)
            .map_err(|_| TokenError::InvalidSignature)?;

        if !self.store.exists(token).await? {
            return Err(TokenError::UnknownToken);
        }

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Remove a token from the store; later validation yields `UnknownToken`
    pub async fn revoke(&self, token: &str) -> Result<bool, TokenError> {
        Ok(self.store.delete(token).await?)
    }

    /// Drop every expired token row
    pub async fn purge_expired(&self) -> Result<u64, TokenError> {
        let purged = self.store.purge_expired(Utc::now()).await?;
        info!("Removed {} expired tokens", purged);
        Ok(purged)
    }
}
