//! In-memory shop store used by handler tests

use async_trait::async_trait;
use auth::models::DEFAULT_AVATAR;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::shop::{NewPosition, NewShop, NewStaff, Position, Shop, Staff, UpdateShop};
use crate::repositories::ShopStore;

#[derive(Debug, Default)]
pub struct InMemoryShopStore {
    shops: RwLock<HashMap<Uuid, Shop>>,
    positions: RwLock<HashMap<Uuid, Position>>,
    staff: RwLock<HashMap<Uuid, Staff>>,
}

impl InMemoryShopStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopStore for InMemoryShopStore {
    async fn create_shop(&self, owner_id: Uuid, new_shop: &NewShop) -> DatabaseResult<Shop> {
        let shop = Shop {
            id: Uuid::new_v4(),
            owner_id,
            name: new_shop.name.clone(),
            description: new_shop.description.clone(),
            avatar_img: new_shop
                .avatar_img
                .clone()
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            is_verified: false,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.shops.write().await.insert(shop.id, shop.clone());
        Ok(shop)
    }

    async fn find_shop(&self, id: Uuid) -> DatabaseResult<Option<Shop>> {
        Ok(self.shops.read().await.get(&id).cloned())
    }

    async fn list_shops(&self) -> DatabaseResult<Vec<Shop>> {
        let mut shops: Vec<Shop> = self
            .shops
            .read()
            .await
            .values()
            .filter(|s| !s.is_deleted)
            .cloned()
            .collect();
        shops.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shops)
    }

    async fn update_shop(&self, update: &UpdateShop) -> DatabaseResult<Shop> {
        let mut shops = self.shops.write().await;
        let shop = shops.get_mut(&update.id).ok_or(DatabaseError::NotFound)?;
        if let Some(name) = &update.name {
            shop.name = name.clone();
        }
        if let Some(description) = &update.description {
            shop.description = description.clone();
        }
        if let Some(avatar_img) = &update.avatar_img {
            shop.avatar_img = avatar_img.clone();
        }
        Ok(shop.clone())
    }

    async fn soft_delete_shop(&self, id: Uuid) -> DatabaseResult<()> {
        let mut shops = self.shops.write().await;
        let shop = shops.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        shop.is_deleted = true;
        Ok(())
    }

    async fn create_position(
        &self,
        creator_id: Uuid,
        new_position: &NewPosition,
    ) -> DatabaseResult<Position> {
        let now = Utc::now();
        let position = Position {
            id: Uuid::new_v4(),
            creator_id,
            name: new_position.name.clone(),
            can_add_staff: new_position.can_add_staff,
            can_change_staff: new_position.can_change_staff,
            can_delete_staff: new_position.can_delete_staff,
            can_add_product: new_position.can_add_product,
            can_change_product: new_position.can_change_product,
            can_delete_product: new_position.can_delete_product,
            created_at: now,
            updated_at: now,
        };
        self.positions
            .write()
            .await
            .insert(position.id, position.clone());
        Ok(position)
    }

    async fn find_position(&self, id: Uuid) -> DatabaseResult<Option<Position>> {
        Ok(self.positions.read().await.get(&id).cloned())
    }

    async fn list_positions(&self, creator_id: Uuid) -> DatabaseResult<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .values()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn save_position(&self, position: &Position) -> DatabaseResult<Position> {
        let mut positions = self.positions.write().await;
        let stored = positions
            .get_mut(&position.id)
            .ok_or(DatabaseError::NotFound)?;
        *stored = Position {
            updated_at: Utc::now(),
            ..position.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_position(&self, id: Uuid) -> DatabaseResult<()> {
        self.positions
            .write()
            .await
            .remove(&id)
            .ok_or(DatabaseError::NotFound)?;

        for member in self.staff.write().await.values_mut() {
            if member.position_id == Some(id) {
                member.position_id = None;
            }
        }
        Ok(())
    }

    async fn add_staff(&self, shop_id: Uuid, new_staff: &NewStaff) -> DatabaseResult<Staff> {
        let mut staff = self.staff.write().await;
        if staff
            .values()
            .any(|s| s.shop_id == shop_id && s.user_id == new_staff.user_id)
        {
            return Err(DatabaseError::UniqueViolation(
                "staff_shop_user_key".to_string(),
            ));
        }

        let member = Staff {
            id: Uuid::new_v4(),
            shop_id,
            user_id: new_staff.user_id,
            position_id: new_staff.position_id,
        };
        staff.insert(member.id, member.clone());
        Ok(member)
    }

    async fn find_staff(&self, id: Uuid) -> DatabaseResult<Option<Staff>> {
        Ok(self.staff.read().await.get(&id).cloned())
    }

    async fn find_staff_member(
        &self,
        shop_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Staff>> {
        Ok(self
            .staff
            .read()
            .await
            .values()
            .find(|s| s.shop_id == shop_id && s.user_id == user_id)
            .cloned())
    }

    async fn list_staff(&self, shop_id: Uuid) -> DatabaseResult<Vec<Staff>> {
        Ok(self
            .staff
            .read()
            .await
            .values()
            .filter(|s| s.shop_id == shop_id)
            .cloned()
            .collect())
    }

    async fn set_staff_position(
        &self,
        id: Uuid,
        position_id: Option<Uuid>,
    ) -> DatabaseResult<Staff> {
        let mut staff = self.staff.write().await;
        let member = staff.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        member.position_id = position_id;
        Ok(member.clone())
    }

    async fn remove_staff(&self, id: Uuid) -> DatabaseResult<()> {
        self.staff
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound)
    }
}
