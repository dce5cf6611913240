//! Access policy checks
//!
//! Pure predicates evaluated after session resolution. Each returns
//! `Forbidden` on failure so handlers can short-circuit with `?` before any
//! mutation.

use uuid::Uuid;

use crate::{
    error::AuthError,
    models::{Role, User},
};

/// The actor must be the target user
pub fn require_self(actor: &User, target_id: Uuid) -> Result<(), AuthError> {
    if actor.id == target_id {
        Ok(())
    } else {
        Err(AuthError::forbidden("not enough rights"))
    }
}

/// The actor must be an admin or a superuser
pub fn require_admin(actor: &User) -> Result<(), AuthError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(AuthError::forbidden("not enough rights"))
    }
}

pub fn require_superuser(actor: &User) -> Result<(), AuthError> {
    if actor.role == Role::Superuser {
        Ok(())
    } else {
        Err(AuthError::forbidden("not enough rights"))
    }
}

/// The actor must be the target user or an admin
pub fn require_self_or_admin(actor: &User, target_id: Uuid) -> Result<(), AuthError> {
    require_self(actor, target_id).or_else(|_| require_admin(actor))
}

/// The actor's role must strictly outrank the target's
pub fn require_higher_rank(actor: &User, target: &User) -> Result<(), AuthError> {
    if actor.role > target.role {
        Ok(())
    } else {
        Err(AuthError::forbidden("not enough rights"))
    }
}

/// The actor is the target, or an admin strictly outranking the target
pub fn require_self_or_higher_rank(actor: &User, target: &User) -> Result<(), AuthError> {
    if actor.id == target.id {
        return Ok(());
    }
    require_admin(actor)?;
    require_higher_rank(actor, target)
}

/// The actor must own the resource
pub fn require_owner(actor: &User, owner_id: Uuid) -> Result<(), AuthError> {
    if actor.id == owner_id {
        Ok(())
    } else {
        Err(AuthError::forbidden("only the owner can do this"))
    }
}
