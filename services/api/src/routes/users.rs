//! User management endpoints

use auth::{
    CurrentUser, Envelope,
    extract::{Json, Path},
    models::{UpdateUser, User, UserProfile},
    policy::{
        require_admin, require_higher_rank, require_self_or_admin, require_self_or_higher_rank,
        require_superuser,
    },
    validation::validate_email,
};
use axum::{
    Extension, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use common::error::DatabaseError;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{SetRoleRequest, UpdateUserRequest, UserIdRequest},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).patch(update_user))
        .route("/users/me", get(current_user))
        .route("/users/set-role", post(set_role))
        .route("/users/block", post(block_user))
        .route("/users/unblock", post(unblock_user))
        .route("/users/:user", get(get_user).delete(delete_user))
}

/// Look up a user that has not been deleted
async fn existing_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    state
        .auth
        .users
        .find_by_id(id)
        .await?
        .filter(|user| !user.is_deleted)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.auth.users.list_active().await?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();

    Ok(Envelope::ok("success.", profiles))
}

pub async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> impl IntoResponse {
    Envelope::ok("success.", UserProfile::from(&user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .auth
        .users
        .find_active_by_login(&login)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Envelope::ok("success.", UserProfile::from(&user)))
}

/// Update profile fields of the acting user, or of a lower-ranked user for an admin
pub async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    require_self_or_admin(&actor, payload.id)?;
    let target = existing_user(&state, payload.id).await?;
    require_self_or_higher_rank(&actor, &target)?;

    if let Some(mail) = &payload.mail {
        validate_email(mail).map_err(ApiError::BadRequest)?;
    }

    let update = UpdateUser {
        name: payload.name,
        surname: payload.surname,
        patronymic: payload.patronymic,
        mail: payload.mail,
        avatar_img: payload.avatar_img,
    };
    let user = state
        .auth
        .users
        .update_profile(payload.id, &update)
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => {
                ApiError::BadRequest("mail already in use".to_string())
            }
            other => other.into(),
        })?;

    Ok(Envelope::ok("success.", UserProfile::from(&user)))
}

/// Soft-delete the acting user, or a lower-ranked user for an admin
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_self_or_admin(&actor, id)?;

    let user = state
        .auth
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    if user.is_deleted {
        return Err(ApiError::not_acceptable("user already deleted"));
    }
    require_self_or_higher_rank(&actor, &user)?;

    state.auth.users.soft_delete(id).await?;
    info!("User {} deleted by {}", user.login, actor.login);

    Ok(Envelope::done("deleted"))
}

pub async fn set_role(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<SetRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    require_superuser(&actor)?;
    if payload.id == actor.id {
        return Err(ApiError::Forbidden("cannot change own role".to_string()));
    }
    existing_user(&state, payload.id).await?;

    let user = state.auth.users.set_role(payload.id, payload.role).await?;
    info!("Role of {} set to {} by {}", user.login, user.role, actor.login);

    Ok(Envelope::ok("success.", UserProfile::from(&user)))
}

pub async fn block_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<UserIdRequest>,
) -> ApiResult<impl IntoResponse> {
    change_block_state(&state, &actor, payload.id, true).await
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<UserIdRequest>,
) -> ApiResult<impl IntoResponse> {
    change_block_state(&state, &actor, payload.id, false).await
}

async fn change_block_state(
    state: &AppState,
    actor: &User,
    id: Uuid,
    blocked: bool,
) -> ApiResult<Envelope<UserProfile>> {
    require_admin(actor)?;
    let target = existing_user(state, id).await?;
    require_higher_rank(actor, &target)?;

    if target.is_blocked == blocked {
        let state_name = if blocked { "blocked" } else { "unblocked" };
        return Err(ApiError::not_acceptable(format!(
            "user already {}",
            state_name
        )));
    }

    let user = state.auth.users.set_blocked(id, blocked).await?;
    info!(
        "User {} {} by {}",
        user.login,
        if blocked { "blocked" } else { "unblocked" },
        actor.login
    );

    Ok(Envelope::ok("success.", UserProfile::from(&user)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use auth::{UserStore, models::Role};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_get_users() {
        let app = TestApp::new();
        let (_, token) = app.user("alice", Role::User).await;
        app.user("bob", Role::User).await;

        let (status, body) = app.send("GET", "/api/v1/users", &token, None).await;
        assert_eq!(status, 200);
        assert_eq!(body["body"].as_array().unwrap().len(), 2);

        let (status, body) = app.send("GET", "/api/v1/users/bob", &token, None).await;
        assert_eq!(status, 200);
        assert_eq!(body["body"]["login"], "bob");
        assert!(body["body"].get("password_hash").is_none());

        let (status, _) = app.send("GET", "/api/v1/users/nobody", &token, None).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_update_self_and_forbid_others() {
        let app = TestApp::new();
        let (alice, token) = app.user("alice", Role::User).await;
        let (bob, _) = app.user("bob", Role::User).await;

        let (status, body) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &token,
                Some(json!({"id": alice.id, "name": "Alice"})),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["body"]["name"], "Alice");

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &token,
                Some(json!({"id": bob.id, "name": "Robert"})),
            )
            .await;
        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_or_taken_mail() {
        let app = TestApp::new();
        let (alice, token) = app.user("alice", Role::User).await;
        app.user("bob", Role::User).await;

        let (status, body) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &token,
                Some(json!({"id": alice.id, "mail": "nope"})),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "wrong email address");

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &token,
                Some(json!({"id": alice.id, "mail": "bob@example.com"})),
            )
            .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_admin_can_update_anyone_missing_user_is_not_found() {
        let app = TestApp::new();
        let (_, admin_token) = app.user("admin", Role::Admin).await;
        let (bob, _) = app.user("bob", Role::User).await;

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &admin_token,
                Some(json!({"id": bob.id, "surname": "Smith"})),
            )
            .await;
        assert_eq!(status, 200);

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &admin_token,
                Some(json!({"id": uuid::Uuid::new_v4(), "surname": "Smith"})),
            )
            .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_not_repeatable() {
        let app = TestApp::new();
        let (_, admin_token) = app.user("admin", Role::Admin).await;
        let (bob, _) = app.user("bob", Role::User).await;
        let uri = format!("/api/v1/users/{}", bob.id);

        let (status, _) = app.send("DELETE", &uri, &admin_token, None).await;
        assert_eq!(status, 200);
        let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(stored.is_deleted);

        let (status, _) = app.send("DELETE", &uri, &admin_token, None).await;
        assert_eq!(status, 406);

        let (status, _) = app
            .send(
                "DELETE",
                &format!("/api/v1/users/{}", uuid::Uuid::new_v4()),
                &admin_token,
                None,
            )
            .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_admin_cannot_update_or_delete_higher_or_equal_rank() {
        let app = TestApp::new();
        let (admin, admin_token) = app.user("admin", Role::Admin).await;
        let (root, _) = app.user("root", Role::Superuser).await;
        let (peer, _) = app.user("peer", Role::Admin).await;

        let (status, body) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &admin_token,
                Some(json!({"id": root.id, "mail": "taken@example.com"})),
            )
            .await;
        assert_eq!(status, 403);
        assert_eq!(body["status"], "fail");
        let stored = app.users.find_by_id(root.id).await.unwrap().unwrap();
        assert_eq!(stored.mail, root.mail);

        for target in [&root, &peer] {
            let uri = format!("/api/v1/users/{}", target.id);
            let (status, _) = app.send("DELETE", &uri, &admin_token, None).await;
            assert_eq!(status, 403);
            let stored = app.users.find_by_id(target.id).await.unwrap().unwrap();
            assert!(!stored.is_deleted);
        }

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &admin_token,
                Some(json!({"id": admin.id, "name": "Ada"})),
            )
            .await;
        assert_eq!(status, 200);

        let uri = format!("/api/v1/users/{}", admin.id);
        let (status, _) = app.send("DELETE", &uri, &admin_token, None).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_superuser_can_update_and_delete_admin() {
        let app = TestApp::new();
        let (_, root_token) = app.user("root", Role::Superuser).await;
        let (admin, _) = app.user("admin", Role::Admin).await;

        let (status, _) = app
            .send(
                "PATCH",
                "/api/v1/users",
                &root_token,
                Some(json!({"id": admin.id, "surname": "Lovelace"})),
            )
            .await;
        assert_eq!(status, 200);

        let uri = format!("/api/v1/users/{}", admin.id);
        let (status, _) = app.send("DELETE", &uri, &root_token, None).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_fail_envelope() {
        let app = TestApp::new();
        let (_, token) = app.user("alice", Role::User).await;

        let (status, body) = app
            .send("DELETE", "/api/v1/users/not-a-uuid", &token, None)
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["status"], "fail");
        assert!(body["body"].is_null());

        let (status, body) = app
            .send("PATCH", "/api/v1/users", &token, Some(json!({"name": "x"})))
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["status"], "fail");
        assert!(body["message"].as_str().unwrap().contains("id"));
    }

    #[tokio::test]
    async fn test_deleted_user_session_is_rejected() {
        let app = TestApp::new();
        let (alice, token) = app.user("alice", Role::User).await;

        let (status, _) = app
            .send("DELETE", &format!("/api/v1/users/{}", alice.id), &token, None)
            .await;
        assert_eq!(status, 200);

        let (status, _) = app.send("GET", "/api/v1/users/me", &token, None).await;
        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn test_set_role_rules() {
        let app = TestApp::new();
        let (root, root_token) = app.user("root", Role::Superuser).await;
        let (_, admin_token) = app.user("admin", Role::Admin).await;
        let (bob, _) = app.user("bob", Role::User).await;

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/set-role",
                &admin_token,
                Some(json!({"id": bob.id, "role": "admin"})),
            )
            .await;
        assert_eq!(status, 403);

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/set-role",
                &root_token,
                Some(json!({"id": root.id, "role": "user"})),
            )
            .await;
        assert_eq!(status, 403);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/users/set-role",
                &root_token,
                Some(json!({"id": bob.id, "role": "admin"})),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["body"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_block_requires_outranking_target() {
        let app = TestApp::new();
        let (_, admin_token) = app.user("admin", Role::Admin).await;
        let (other_admin, _) = app.user("other", Role::Admin).await;
        let (bob, bob_token) = app.user("bob", Role::User).await;

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/block",
                &bob_token,
                Some(json!({"id": other_admin.id})),
            )
            .await;
        assert_eq!(status, 403);

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/block",
                &admin_token,
                Some(json!({"id": other_admin.id})),
            )
            .await;
        assert_eq!(status, 403);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/users/block",
                &admin_token,
                Some(json!({"id": bob.id})),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["body"]["is_blocked"], true);
        let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(stored.blocked_at.is_some());

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/block",
                &admin_token,
                Some(json!({"id": bob.id})),
            )
            .await;
        assert_eq!(status, 406);

        let (status, _) = app.send("GET", "/api/v1/users/me", &bob_token, None).await;
        assert_eq!(status, 403);

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/users/unblock",
                &admin_token,
                Some(json!({"id": bob.id})),
            )
            .await;
        assert_eq!(status, 200);
        let stored = app.users.find_by_id(bob.id).await.unwrap().unwrap();
        assert!(stored.blocked_at.is_none());
    }
}
