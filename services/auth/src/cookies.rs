//! Session cookies and bearer header parsing

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, SameSite};

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Attributes applied to the session cookies
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    /// Only send cookies over HTTPS
    pub secure: bool,
}

impl CookieSettings {
    /// Create cookie settings from environment variables
    ///
    /// # Environment Variables
    /// - `COOKIE_SECURE`: `true` to mark cookies `Secure` (default: false)
    pub fn from_env() -> Self {
        let secure = std::env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        Self { secure }
    }

    /// Build an `HttpOnly` session cookie carrying a token
    pub fn token_cookie(&self, name: &'static str, token: String) -> Cookie<'static> {
        Cookie::build((name, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    /// Cookie matching [`Self::token_cookie`] for removal from a jar
    pub fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        Cookie::build((name, "")).path("/").build()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
