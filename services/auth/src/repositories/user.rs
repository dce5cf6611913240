//! User repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, Role, UpdateUser, User};

/// Credential store
///
/// Lookups named `active` skip soft-deleted accounts; `find_by_id` returns
/// the row whatever its state so callers can tell "gone" from "deleted".
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Duplicate login or mail yields
    /// [`DatabaseError::UniqueViolation`].
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_active_by_login(&self, login: &str) -> DatabaseResult<Option<User>>;

    async fn list_active(&self) -> DatabaseResult<Vec<User>>;

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<User>;

    async fn set_role(&self, id: Uuid, role: Role) -> DatabaseResult<User>;

    /// Block or unblock a user, stamping or clearing `blocked_at`
    async fn set_blocked(&self, id: Uuid, blocked: bool) -> DatabaseResult<User>;

    async fn soft_delete(&self, id: Uuid) -> DatabaseResult<()>;
}

const USER_COLUMNS: &str = "id, login, mail, password_hash, name, surname, patronymic, \
     avatar_img, is_verified, role, is_blocked, blocked_at, is_deleted, created_at";

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        mail: row.try_get("mail")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        patronymic: row.try_get("patronymic")?,
        avatar_img: row.try_get("avatar_img")?,
        is_verified: row.try_get("is_verified")?,
        role,
        is_blocked: row.try_get("is_blocked")?,
        blocked_at: row.try_get("blocked_at")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn updated_user(row: Option<PgRow>) -> DatabaseResult<User> {
    let row = row.ok_or(DatabaseError::NotFound)?;
    user_from_row(&row).map_err(DatabaseError::from_query)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.login);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, login, mail, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.login)
        .bind(&new_user.mail)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        user_from_row(&row).map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn find_active_by_login(&self, login: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = $1 AND NOT is_deleted"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn list_active(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE NOT is_deleted ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(DatabaseError::from_query)
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                surname = COALESCE($3, surname),
                patronymic = COALESCE($4, patronymic),
                mail = COALESCE($5, mail),
                avatar_img = COALESCE($6, avatar_img)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.surname)
        .bind(&update.patronymic)
        .bind(&update.mail)
        .bind(&update.avatar_img)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        updated_user(row)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> DatabaseResult<User> {
        info!("Setting role of user {} to {}", id, role);

        let row = sqlx::query(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        updated_user(row)
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> DatabaseResult<User> {
        info!("Setting blocked={} for user {}", blocked, id);

        let blocked_at = blocked.then(Utc::now);
        let row = sqlx::query(&format!(
            "UPDATE users SET is_blocked = $2, blocked_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(blocked)
        .bind(blocked_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        updated_user(row)
    }

    async fn soft_delete(&self, id: Uuid) -> DatabaseResult<()> {
        info!("Soft-deleting user {}", id);

        let result = sqlx::query("UPDATE users SET is_deleted = TRUE WHERE id = $1")
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
