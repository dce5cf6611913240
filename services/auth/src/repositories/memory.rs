//! In-memory stores
//!
//! Used by tests and local experiments. They mirror the PostgreSQL
//! constraints that matter to callers: unique login and mail, unique token
//! strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{DEFAULT_AVATAR, NewToken, NewUser, Role, Token, UpdateUser, User};
use crate::repositories::{TokenStore, UserStore};

/// In-memory credential store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(
    users: &HashMap<Uuid, User>,
    skip: Option<Uuid>,
    login: Option<&str>,
    mail: Option<&str>,
) -> Option<DatabaseError> {
    users
        .values()
        .filter(|u| Some(u.id) != skip)
        .find_map(|u| {
            if login == Some(u.login.as_str()) {
                Some(DatabaseError::UniqueViolation("users_login_key".to_string()))
            } else if mail == Some(u.mail.as_str()) {
                Some(DatabaseError::UniqueViolation("users_mail_key".to_string()))
            } else {
                None
            }
        })
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        if let Some(err) = conflict(&users, None, Some(&new_user.login), Some(&new_user.mail)) {
            return Err(err);
        }

        let user = User {
            id: Uuid::new_v4(),
            login: new_user.login.clone(),
            mail: new_user.mail.clone(),
            password_hash: new_user.password_hash.clone(),
            name: None,
            surname: None,
            patronymic: None,
            avatar_img: DEFAULT_AVATAR.to_string(),
            is_verified: false,
            role: Role::User,
            is_blocked: false,
            blocked_at: None,
            is_deleted: false,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_active_by_login(&self, login: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.login == login && !u.is_deleted)
            .cloned())
    }

    async fn list_active(&self) -> DatabaseResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| !u.is_deleted)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        if let Some(err) = conflict(&users, Some(id), None, update.mail.as_deref()) {
            return Err(err);
        }

        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(surname) = &update.surname {
            user.surname = Some(surname.clone());
        }
        if let Some(patronymic) = &update.patronymic {
            user.patronymic = Some(patronymic.clone());
        }
        if let Some(mail) = &update.mail {
            user.mail = mail.clone();
        }
        if let Some(avatar_img) = &update.avatar_img {
            user.avatar_img = avatar_img.clone();
        }
        Ok(user.clone())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.role = role;
        Ok(user.clone())
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.is_blocked = blocked;
        user.blocked_at = blocked.then(Utc::now);
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> DatabaseResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.is_deleted = true;
        Ok(())
    }
}

/// In-memory token store
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, Token>>,
    next_id: AtomicI64,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, new_token: &NewToken) -> DatabaseResult<Token> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&new_token.token) {
            return Err(DatabaseError::UniqueViolation("tokens_token_key".to_string()));
        }

        let token = Token {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            user_id: new_token.user_id,
            token: new_token.token.clone(),
            is_refresh: new_token.is_refresh,
            expires_at: new_token.expires_at,
            created_at: Utc::now(),
        };
        tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn exists(&self, token: &str) -> DatabaseResult<bool> {
        Ok(self.tokens.read().await.contains_key(token))
    }

    async fn delete(&self, token: &str) -> DatabaseResult<bool> {
        Ok(self.tokens.write().await.remove(token).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }
}
