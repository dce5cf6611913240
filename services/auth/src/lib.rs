//! Authentication for the marketplace backend
//!
//! JWT issuance and validation backed by a token store, refresh-token
//! rotation, the session resolver used by protected routes, and access
//! policy predicates.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use auth::{AuthState, CookieSettings, JwtConfig, JwtService, TokenRepository, UserRepository};
//! use common::database::{DatabaseConfig, init_pool};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = init_pool(&DatabaseConfig::from_env()?).await?;
//! let state = AuthState::new(
//!     Arc::new(UserRepository::new(pool.clone())),
//!     Arc::new(TokenRepository::new(pool)),
//!     JwtService::new(JwtConfig::from_env()?)?,
//!     CookieSettings::from_env(),
//! );
//! let app = auth::routes::create_router(state);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod cookies;
pub mod error;
pub mod extract;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod tokens;
pub mod validation;

pub use cookies::CookieSettings;
pub use error::AuthError;
pub use jwt::{Claims, JwtConfig, JwtService, TokenKind};
pub use middleware::{CurrentUser, session_middleware};
pub use repositories::{
    InMemoryTokenStore, InMemoryUserStore, TokenRepository, TokenStore, UserRepository, UserStore,
};
pub use response::Envelope;
pub use session::{ResolvedSession, SessionResolver};
pub use state::AuthState;
pub use tokens::{TokenError, TokenService};
