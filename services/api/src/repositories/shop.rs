//! Shop repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use auth::models::DEFAULT_AVATAR;

use crate::models::shop::{NewPosition, NewShop, NewStaff, Position, Shop, Staff, UpdateShop};

/// Store for shops, staff positions and staff memberships
///
/// `find_*` lookups return rows whatever their deletion state; listings
/// skip soft-deleted shops. Mutations of a missing row yield
/// [`DatabaseError::NotFound`].
#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn create_shop(&self, owner_id: Uuid, new_shop: &NewShop) -> DatabaseResult<Shop>;

    async fn find_shop(&self, id: Uuid) -> DatabaseResult<Option<Shop>>;

    async fn list_shops(&self) -> DatabaseResult<Vec<Shop>>;

    async fn update_shop(&self, update: &UpdateShop) -> DatabaseResult<Shop>;

    async fn soft_delete_shop(&self, id: Uuid) -> DatabaseResult<()>;

    async fn create_position(
        &self,
        creator_id: Uuid,
        new_position: &NewPosition,
    ) -> DatabaseResult<Position>;

    async fn find_position(&self, id: Uuid) -> DatabaseResult<Option<Position>>;

    async fn list_positions(&self, creator_id: Uuid) -> DatabaseResult<Vec<Position>>;

    /// Persist every field of an existing position, bumping `updated_at`
    async fn save_position(&self, position: &Position) -> DatabaseResult<Position>;

    /// Delete a position; staff holding it are left without one
    async fn delete_position(&self, id: Uuid) -> DatabaseResult<()>;

    /// Add a user to a shop's staff. A user already on the staff yields
    /// [`DatabaseError::UniqueViolation`].
    async fn add_staff(&self, shop_id: Uuid, new_staff: &NewStaff) -> DatabaseResult<Staff>;

    async fn find_staff(&self, id: Uuid) -> DatabaseResult<Option<Staff>>;

    async fn find_staff_member(&self, shop_id: Uuid, user_id: Uuid)
    -> DatabaseResult<Option<Staff>>;

    async fn list_staff(&self, shop_id: Uuid) -> DatabaseResult<Vec<Staff>>;

    async fn set_staff_position(
        &self,
        id: Uuid,
        position_id: Option<Uuid>,
    ) -> DatabaseResult<Staff>;

    async fn remove_staff(&self, id: Uuid) -> DatabaseResult<()>;
}

const SHOP_COLUMNS: &str =
    "id, owner_id, name, description, avatar_img, is_verified, is_deleted, created_at";

const POSITION_COLUMNS: &str = "id, creator_id, name, can_add_staff, can_change_staff, \
     can_delete_staff, can_add_product, can_change_product, can_delete_product, \
     created_at, updated_at";

const STAFF_COLUMNS: &str = "id, shop_id, user_id, position_id";

fn shop_from_row(row: &PgRow) -> Result<Shop, sqlx::Error> {
    Ok(Shop {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        avatar_img: row.try_get("avatar_img")?,
        is_verified: row.try_get("is_verified")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
    })
}

fn position_from_row(row: &PgRow) -> Result<Position, sqlx::Error> {
    Ok(Position {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        name: row.try_get("name")?,
        can_add_staff: row.try_get("can_add_staff")?,
        can_change_staff: row.try_get("can_change_staff")?,
        can_delete_staff: row.try_get("can_delete_staff")?,
        can_add_product: row.try_get("can_add_product")?,
        can_change_product: row.try_get("can_change_product")?,
        can_delete_product: row.try_get("can_delete_product")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn staff_from_row(row: &PgRow) -> Result<Staff, sqlx::Error> {
    Ok(Staff {
        id: row.try_get("id")?,
        shop_id: row.try_get("shop_id")?,
        user_id: row.try_get("user_id")?,
        position_id: row.try_get("position_id")?,
    })
}

/// Map an optional row, failing with `NotFound` when the statement touched nothing
fn required<T>(
    row: Option<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> DatabaseResult<T> {
    let row = row.ok_or(DatabaseError::NotFound)?;
    map(&row).map_err(DatabaseError::from_query)
}

fn optional<T>(
    row: Option<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> DatabaseResult<Option<T>> {
    row.as_ref()
        .map(map)
        .transpose()
        .map_err(DatabaseError::from_query)
}

fn all<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> Result<T, sqlx::Error>) -> DatabaseResult<Vec<T>> {
    rows.iter()
        .map(map)
        .collect::<Result<_, _>>()
        .map_err(DatabaseError::from_query)
}

/// PostgreSQL-backed shop repository
#[derive(Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    /// Create a new shop repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for ShopRepository {
    async fn create_shop(&self, owner_id: Uuid, new_shop: &NewShop) -> DatabaseResult<Shop> {
        info!("Creating shop {} for owner {}", new_shop.name, owner_id);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO shops (id, owner_id, name, description, avatar_img)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&new_shop.name)
        .bind(&new_shop.description)
        .bind(new_shop.avatar_img.as_deref().unwrap_or(DEFAULT_AVATAR))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, shop_from_row)
    }

    async fn find_shop(&self, id: Uuid) -> DatabaseResult<Option<Shop>> {
        let row = sqlx::query(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        optional(row, shop_from_row)
    }

    async fn list_shops(&self) -> DatabaseResult<Vec<Shop>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE NOT is_deleted ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        all(rows, shop_from_row)
    }

    async fn update_shop(&self, update: &UpdateShop) -> DatabaseResult<Shop> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE shops
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                avatar_img = COALESCE($4, avatar_img)
            WHERE id = $1
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(update.id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.avatar_img)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, shop_from_row)
    }

    async fn soft_delete_shop(&self, id: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE shops SET is_deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        info!("Soft-deleted shop {}", id);
        Ok(())
    }

    async fn create_position(
        &self,
        creator_id: Uuid,
        new_position: &NewPosition,
    ) -> DatabaseResult<Position> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO positions (id, creator_id, name, can_add_staff, can_change_staff,
                                   can_delete_staff, can_add_product, can_change_product,
                                   can_delete_product)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(creator_id)
        .bind(&new_position.name)
        .bind(new_position.can_add_staff)
        .bind(new_position.can_change_staff)
        .bind(new_position.can_delete_staff)
        .bind(new_position.can_add_product)
        .bind(new_position.can_change_product)
        .bind(new_position.can_delete_product)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, position_from_row)
    }

    async fn find_position(&self, id: Uuid) -> DatabaseResult<Option<Position>> {
        let row = sqlx::query(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        optional(row, position_from_row)
    }

    async fn list_positions(&self, creator_id: Uuid) -> DatabaseResult<Vec<Position>> {
        let rows = sqlx::query(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE creator_id = $1 ORDER BY created_at"
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        all(rows, position_from_row)
    }

    async fn save_position(&self, position: &Position) -> DatabaseResult<Position> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE positions
            SET name = $2,
                can_add_staff = $3,
                can_change_staff = $4,
                can_delete_staff = $5,
                can_add_product = $6,
                can_change_product = $7,
                can_delete_product = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(position.id)
        .bind(&position.name)
        .bind(position.can_add_staff)
        .bind(position.can_change_staff)
        .bind(position.can_delete_staff)
        .bind(position.can_add_product)
        .bind(position.can_change_product)
        .bind(position.can_delete_product)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, position_from_row)
    }

    async fn delete_position(&self, id: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn add_staff(&self, shop_id: Uuid, new_staff: &NewStaff) -> DatabaseResult<Staff> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO staff (id, shop_id, user_id, position_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {STAFF_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(shop_id)
        .bind(new_staff.user_id)
        .bind(new_staff.position_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, staff_from_row)
    }

    async fn find_staff(&self, id: Uuid) -> DatabaseResult<Option<Staff>> {
        let row = sqlx::query(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        optional(row, staff_from_row)
    }

    async fn find_staff_member(
        &self,
        shop_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Staff>> {
        let row = sqlx::query(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE shop_id = $1 AND user_id = $2"
        ))
        .bind(shop_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        optional(row, staff_from_row)
    }

    async fn list_staff(&self, shop_id: Uuid) -> DatabaseResult<Vec<Staff>> {
        let rows = sqlx::query(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE shop_id = $1"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        all(rows, staff_from_row)
    }

    async fn set_staff_position(
        &self,
        id: Uuid,
        position_id: Option<Uuid>,
    ) -> DatabaseResult<Staff> {
        let row = sqlx::query(&format!(
            "UPDATE staff SET position_id = $2 WHERE id = $1 RETURNING {STAFF_COLUMNS}"
        ))
        .bind(id)
        .bind(position_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        required(row, staff_from_row)
    }

    async fn remove_staff(&self, id: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
