//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Avatar assigned to accounts that never uploaded one
pub const DEFAULT_AVATAR: &str = "default.png";

/// User entity
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub mail: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub avatar_img: String,
    pub is_verified: bool,
    pub role: Role,
    pub is_blocked: bool,
    pub blocked_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload, carrying an already hashed password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub mail: String,
    pub password_hash: String,
}

/// User profile update payload; `None` fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub mail: Option<String>,
    pub avatar_img: Option<String>,
}

/// Public view of a user, safe to return to any authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub login: String,
    pub mail: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub avatar_img: String,
    pub role: Role,
    pub is_blocked: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            mail: user.mail.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            patronymic: user.patronymic.clone(),
            avatar_img: user.avatar_img.clone(),
            role: user.role,
            is_blocked: user.is_blocked,
        }
    }
}

/// Sign-up request body
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub login: String,
    pub mail: String,
    pub password: String,
}

/// Sign-in form, as posted by OAuth2 password-flow clients
#[derive(Debug, Clone, Deserialize)]
pub struct SigninForm {
    pub username: String,
    pub password: String,
}
