//! Authentication service models

pub mod role;
pub mod token;
pub mod user;

// Re-export for convenience
pub use role::{Role, UnknownRole};
pub use token::{NewToken, Token};
pub use user::{DEFAULT_AVATAR, NewUser, SigninForm, SignupRequest, UpdateUser, User, UserProfile};
