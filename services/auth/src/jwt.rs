//! JWT signing and decoding
//!
//! This module owns the claim layout and the shared-secret keys. It knows
//! nothing about persistence; see [`crate::tokens`] for issuance and
//! validation against the token store.

use anyhow::Result;
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Upper bound for either token lifetime
pub const MAX_LIFETIME_DAYS: i64 = 3650;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// HMAC algorithm used for signing
    pub algorithm: Algorithm,
    /// Access token lifetime (default: 1 day)
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime (default: 30 days)
    pub refresh_token_lifetime: Duration,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared signing secret (required)
    /// - `JWT_ALGORITHM`: One of `HS256`, `HS384`, `HS512` (default: `HS256`)
    /// - `JWT_ACCESS_LIFETIME`: Access token lifetime in days (default: 1)
    /// - `JWT_REFRESH_LIFETIME`: Refresh token lifetime in days (default: 30)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let algorithm = std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());
        let algorithm = Algorithm::from_str(&algorithm)
            .map_err(|_| anyhow::anyhow!("Unknown JWT_ALGORITHM: {}", algorithm))?;

        Ok(JwtConfig {
            secret,
            algorithm,
            access_token_lifetime: lifetime_from_env("JWT_ACCESS_LIFETIME", 1)?,
            refresh_token_lifetime: lifetime_from_env("JWT_REFRESH_LIFETIME", 30)?,
        })
    }
}

fn lifetime_from_env(name: &str, default_days: i64) -> Result<Duration> {
    let days = std::env::var(name)
        .unwrap_or_else(|_| default_days.to_string())
        .parse()
        .unwrap_or(default_days);

    Duration::try_days(days).ok_or_else(|| anyhow::anyhow!("{} is out of range: {}", name, days))
}

/// Token category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, presented on every request
    Access,
    /// Long-lived, only used to mint new access tokens
    Refresh,
}

impl TokenKind {
    pub fn is_refresh(&self) -> bool {
        matches!(self, TokenKind::Refresh)
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Login of the user the token is bound to
    pub login: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiration, unix seconds
    pub exp: i64,
    /// Whether this is a refresh token
    pub is_refresh: bool,
    /// Random token id; keeps tokens issued in the same second distinct
    pub jti: Uuid,
}

impl Claims {
    pub fn kind(&self) -> TokenKind {
        if self.is_refresh {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            anyhow::bail!(
                "Unsupported JWT algorithm {:?}: only HMAC algorithms work with a shared secret",
                config.algorithm
            );
        }
        if config.secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }
        for (name, lifetime) in [
            ("access", config.access_token_lifetime),
            ("refresh", config.refresh_token_lifetime),
        ] {
            if lifetime <= Duration::zero() || lifetime > Duration::days(MAX_LIFETIME_DAYS) {
                anyhow::bail!(
                    "JWT {} token lifetime must be between 1 second and {} days",
                    name,
                    MAX_LIFETIME_DAYS
                );
            }
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked after the token store lookup, not while decoding
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    /// Sign a claim set
    pub fn encode(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
    }

    /// Verify the signature and algorithm of a token and return its claims
    pub fn decode(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }

    /// Configured lifetime for a token kind
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.config.access_token_lifetime,
            TokenKind::Refresh => self.config.refresh_token_lifetime,
        }
    }
}
