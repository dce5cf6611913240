//! Credential and token stores

pub mod memory;
pub mod token;
pub mod user;

pub use memory::{InMemoryTokenStore, InMemoryUserStore};
pub use token::{TokenRepository, TokenStore};
pub use user::{UserRepository, UserStore};
