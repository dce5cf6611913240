//! Shop, position and staff models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shop entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shop {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub avatar_img: String,
    pub is_verified: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Request for shop creation; the owner is the acting user
#[derive(Debug, Clone, Deserialize)]
pub struct NewShop {
    pub name: String,
    pub description: String,
    pub avatar_img: Option<String>,
}

/// Request for shop update; `None` fields are left untouched
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShop {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_img: Option<String>,
}

/// A named set of staff permissions, owned by the user who created it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub can_add_staff: bool,
    pub can_change_staff: bool,
    pub can_delete_staff: bool,
    pub can_add_product: bool,
    pub can_change_product: bool,
    pub can_delete_product: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permissions a position may grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    AddStaff,
    ChangeStaff,
    DeleteStaff,
}

impl Position {
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::AddStaff => self.can_add_staff,
            Permission::ChangeStaff => self.can_change_staff,
            Permission::DeleteStaff => self.can_delete_staff,
        }
    }
}

/// Request for position creation. Omitted flags default to `false`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPosition {
    pub name: String,
    pub can_add_staff: bool,
    pub can_change_staff: bool,
    pub can_delete_staff: bool,
    pub can_add_product: bool,
    pub can_change_product: bool,
    pub can_delete_product: bool,
}

/// Request for position update; `None` fields are left untouched
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePosition {
    pub id: Uuid,
    pub name: Option<String>,
    pub can_add_staff: Option<bool>,
    pub can_change_staff: Option<bool>,
    pub can_delete_staff: Option<bool>,
    pub can_add_product: Option<bool>,
    pub can_change_product: Option<bool>,
    pub can_delete_product: Option<bool>,
}

impl UpdatePosition {
    /// Apply the present fields onto a stored position
    pub fn apply(&self, position: &mut Position) {
        if let Some(name) = &self.name {
            position.name = name.clone();
        }
        let flags = [
            (self.can_add_staff, &mut position.can_add_staff),
            (self.can_change_staff, &mut position.can_change_staff),
            (self.can_delete_staff, &mut position.can_delete_staff),
            (self.can_add_product, &mut position.can_add_product),
            (self.can_change_product, &mut position.can_change_product),
            (self.can_delete_product, &mut position.can_delete_product),
        ];
        for (update, flag) in flags {
            if let Some(value) = update {
                *flag = value;
            }
        }
    }
}

/// Membership of a user in a shop's staff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Staff {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Uuid,
    pub position_id: Option<Uuid>,
}

/// Request for adding a staff member
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    pub user_id: Uuid,
    pub position_id: Option<Uuid>,
}

/// Request for changing a staff member's position
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStaff {
    pub position_id: Option<Uuid>,
}
