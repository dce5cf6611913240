//! Authentication state shared across handlers and middleware

use std::sync::Arc;

use crate::{
    cookies::CookieSettings,
    jwt::JwtService,
    repositories::{TokenStore, UserStore},
    session::SessionResolver,
    tokens::TokenService,
};

/// Authentication state shared across handlers
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub sessions: SessionResolver,
    pub cookies: CookieSettings,
}

impl AuthState {
    /// Wire the token service and session resolver over the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        token_store: Arc<dyn TokenStore>,
        jwt: JwtService,
        cookies: CookieSettings,
    ) -> Self {
        let tokens = TokenService::new(jwt, token_store);
        let sessions = SessionResolver::new(tokens.clone(), users.clone());

        Self {
            users,
            tokens,
            sessions,
            cookies,
        }
    }
}
