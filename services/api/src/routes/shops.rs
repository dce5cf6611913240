//! Shop, position and staff endpoints
//!
//! Shops are managed by their owner alone. Staff management is also open to
//! staff members whose position grants the matching permission.

use auth::{
    CurrentUser, Envelope,
    extract::{Json, Path},
    models::User,
    policy::require_owner,
};
use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use common::error::DatabaseError;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::shop::{
        NewPosition, NewShop, NewStaff, Permission, Position, Shop, Staff, UpdatePosition,
        UpdateShop, UpdateStaff,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops", get(list_shops).post(create_shop).patch(update_shop))
        .route(
            "/shops/positions",
            get(list_positions)
                .post(create_position)
                .patch(update_position),
        )
        .route(
            "/shops/positions/:id",
            get(get_position).delete(delete_position),
        )
        .route("/shops/:id", get(get_shop).delete(delete_shop))
        .route("/shops/:id/staff", get(list_staff).post(add_staff))
        .route(
            "/shops/:id/staff/:staff_id",
            patch(update_staff).delete(remove_staff),
        )
}

/// Shop lookup including soft-deleted rows
async fn find_shop(state: &AppState, id: Uuid) -> ApiResult<Shop> {
    state
        .shops
        .find_shop(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop"))
}

/// Shop lookup treating soft-deleted shops as absent
async fn active_shop(state: &AppState, id: Uuid) -> ApiResult<Shop> {
    let shop = find_shop(state, id).await?;
    if shop.is_deleted {
        return Err(ApiError::not_found("Shop"));
    }
    Ok(shop)
}

async fn find_position(state: &AppState, id: Uuid) -> ApiResult<Position> {
    state
        .shops
        .find_position(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Position"))
}

/// A staff member of this shop
async fn shop_staff(state: &AppState, shop: &Shop, staff_id: Uuid) -> ApiResult<Staff> {
    state
        .shops
        .find_staff(staff_id)
        .await?
        .filter(|staff| staff.shop_id == shop.id)
        .ok_or_else(|| ApiError::not_found("Staff"))
}

/// The actor owns the shop or holds a position granting `permission` in it
async fn require_staff_permission(
    state: &AppState,
    actor: &User,
    shop: &Shop,
    permission: Permission,
) -> ApiResult<()> {
    if actor.id == shop.owner_id {
        return Ok(());
    }

    let position_id = state
        .shops
        .find_staff_member(shop.id, actor.id)
        .await?
        .and_then(|member| member.position_id);

    if let Some(position_id) = position_id {
        if let Some(position) = state.shops.find_position(position_id).await? {
            if position.allows(permission) {
                return Ok(());
            }
        }
    }

    Err(ApiError::Forbidden("not enough rights".to_string()))
}

/// A position assigned to staff must have been created by the shop owner
async fn assignable_position(
    state: &AppState,
    shop: &Shop,
    position_id: Option<Uuid>,
) -> ApiResult<Option<Uuid>> {
    let Some(position_id) = position_id else {
        return Ok(None);
    };

    let position = find_position(state, position_id).await?;
    if position.creator_id != shop.owner_id {
        return Err(ApiError::BadRequest(
            "position does not belong to the shop owner".to_string(),
        ));
    }
    Ok(Some(position.id))
}

pub async fn list_shops(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let shops = state.shops.list_shops().await?;
    Ok(Envelope::ok("success.", shops))
}

pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let shop = active_shop(&state, id).await?;
    Ok(Envelope::ok("success.", shop))
}

pub async fn create_shop(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<NewShop>,
) -> ApiResult<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Shop name is required".to_string()));
    }

    let shop = state.shops.create_shop(actor.id, &payload).await?;
    info!("Shop {} created by {}", shop.id, actor.login);

    Ok((StatusCode::CREATED, Envelope::ok("Created", shop)))
}

pub async fn update_shop(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<UpdateShop>,
) -> ApiResult<impl IntoResponse> {
    let shop = find_shop(&state, payload.id).await?;
    require_owner(&actor, shop.owner_id)?;
    if shop.is_deleted {
        return Err(ApiError::not_acceptable("shop is deleted"));
    }

    let shop = state.shops.update_shop(&payload).await?;
    Ok(Envelope::ok("success.", shop))
}

pub async fn delete_shop(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let shop = find_shop(&state, id).await?;
    require_owner(&actor, shop.owner_id)?;
    if shop.is_deleted {
        return Err(ApiError::not_acceptable("shop already deleted"));
    }

    state.shops.soft_delete_shop(id).await?;
    info!("Shop {} deleted by {}", id, actor.login);

    Ok(Envelope::done("deleted"))
}

pub async fn list_positions(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let positions = state.shops.list_positions(actor.id).await?;
    Ok(Envelope::ok("success.", positions))
}

pub async fn get_position(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let position = find_position(&state, id).await?;
    require_owner(&actor, position.creator_id)?;

    Ok(Envelope::ok("success.", position))
}

pub async fn create_position(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<NewPosition>,
) -> ApiResult<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Position name is required".to_string()));
    }

    let position = state.shops.create_position(actor.id, &payload).await?;
    Ok((StatusCode::CREATED, Envelope::ok("Created", position)))
}

pub async fn update_position(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<UpdatePosition>,
) -> ApiResult<impl IntoResponse> {
    let mut position = find_position(&state, payload.id).await?;
    require_owner(&actor, position.creator_id)?;

    payload.apply(&mut position);
    let position = state.shops.save_position(&position).await?;

    Ok(Envelope::ok("success.", position))
}

pub async fn delete_position(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let position = find_position(&state, id).await?;
    require_owner(&actor, position.creator_id)?;

    state.shops.delete_position(id).await?;
    Ok(Envelope::done("deleted"))
}

/// Staff of a shop, visible to its owner and its staff
pub async fn list_staff(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let shop = active_shop(&state, id).await?;
    let staff = state.shops.list_staff(shop.id).await?;

    if actor.id != shop.owner_id && !staff.iter().any(|member| member.user_id == actor.id) {
        return Err(ApiError::Forbidden("not enough rights".to_string()));
    }

    Ok(Envelope::ok("success.", staff))
}

pub async fn add_staff(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewStaff>,
) -> ApiResult<impl IntoResponse> {
    let shop = active_shop(&state, id).await?;
    require_staff_permission(&state, &actor, &shop, Permission::AddStaff).await?;

    state
        .auth
        .users
        .find_by_id(payload.user_id)
        .await?
        .filter(|user| !user.is_deleted)
        .ok_or_else(|| ApiError::not_found("User"))?;
    let position_id = assignable_position(&state, &shop, payload.position_id).await?;

    let member = state
        .shops
        .add_staff(
            shop.id,
            &NewStaff {
                user_id: payload.user_id,
                position_id,
            },
        )
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => {
                ApiError::BadRequest("user is already staff of this shop".to_string())
            }
            other => other.into(),
        })?;
    info!("User {} joined staff of shop {}", member.user_id, shop.id);

    Ok((StatusCode::CREATED, Envelope::ok("Created", member)))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path((id, staff_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStaff>,
) -> ApiResult<impl IntoResponse> {
    let shop = active_shop(&state, id).await?;
    require_staff_permission(&state, &actor, &shop, Permission::ChangeStaff).await?;

    let member = shop_staff(&state, &shop, staff_id).await?;
    let position_id = assignable_position(&state, &shop, payload.position_id).await?;
    let member = state
        .shops
        .set_staff_position(member.id, position_id)
        .await?;

    Ok(Envelope::ok("success.", member))
}

pub async fn remove_staff(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path((id, staff_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let shop = active_shop(&state, id).await?;
    require_staff_permission(&state, &actor, &shop, Permission::DeleteStaff).await?;

    let member = shop_staff(&state, &shop, staff_id).await?;
    state.shops.remove_staff(member.id).await?;
    info!("User {} left staff of shop {}", member.user_id, shop.id);

    Ok(Envelope::done("deleted"))
}
