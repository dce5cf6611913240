//! API models for request and response payloads

use auth::models::Role;
use serde::Deserialize;
use uuid::Uuid;

pub mod shop;

/// Request for user profile update
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: Uuid,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub mail: Option<String>,
    pub avatar_img: Option<String>,
}

/// Request for a role change
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub id: Uuid,
    pub role: Role,
}

/// Request naming a single user
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdRequest {
    pub id: Uuid,
}
