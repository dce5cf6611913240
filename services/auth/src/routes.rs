//! Authentication routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use common::error::DatabaseError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    cookies::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, bearer_token},
    error::AuthError,
    extract::{self, Form},
    jwt::TokenKind,
    models::{NewUser, SigninForm, SignupRequest, UserProfile},
    password::{hash_password, verify_password},
    response::Envelope,
    state::AuthState,
    validation::validate_signup,
};

const INVALID_CREDENTIALS: &str = "Incorrect username or password";

/// Response for a successful sign-in
#[derive(Serialize)]
pub struct SigninResponse {
    #[serde(flatten)]
    pub envelope: Envelope<UserProfile>,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Create the router for the authentication endpoints
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/signin", post(signin))
        .route("/signup", post(signup))
        .route("/signout", post(signout))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "marketplace"
    }))
}

/// Exchange login and password for an access/refresh token pair
pub async fn signin(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<SigninForm>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Sign-in attempt for user: {}", form.username);

    let user = state
        .users
        .find_active_by_login(&form.username)
        .await?
        .ok_or_else(|| AuthError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    let matches = verify_password(&user.password_hash, &form.password).map_err(|e| {
        error!("Stored password hash for {} is unusable: {}", user.login, e);
        AuthError::InternalServerError
    })?;
    if !matches {
        warn!("Wrong password for user: {}", user.login);
        return Err(AuthError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    if user.is_blocked {
        return Err(AuthError::forbidden("user is blocked"));
    }

    let access_token = state.tokens.issue(&user, TokenKind::Access).await?;
    let refresh_token = state.tokens.issue(&user, TokenKind::Refresh).await?;

    let jar = jar
        .add(
            state
                .cookies
                .token_cookie(ACCESS_COOKIE_NAME, access_token.clone()),
        )
        .add(
            state
                .cookies
                .token_cookie(REFRESH_COOKIE_NAME, refresh_token.clone()),
        );

    let response = SigninResponse {
        envelope: Envelope::ok("success.", UserProfile::from(&user)),
        access_token,
        refresh_token,
        token_type: "bearer",
    };

    Ok((jar, Json(response)))
}

/// Register a new account
pub async fn signup(
    State(state): State<AuthState>,
    extract::Json(payload): extract::Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    validate_signup(&payload.login, &payload.mail, &payload.password)
        .map_err(AuthError::BadRequest)?;

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        AuthError::InternalServerError
    })?;

    let user = state
        .users
        .create(&NewUser {
            login: payload.login,
            mail: payload.mail,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(constraint) => {
                error!("User registration rejected by {}", constraint);
                AuthError::BadRequest("user already exists".to_string())
            }
            other => other.into(),
        })?;

    info!("Registered user: {}", user.login);
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Created", UserProfile::from(&user)),
    ))
}

/// Revoke the presented tokens and clear the session cookies
pub async fn signout(
    State(state): State<AuthState>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let presented = [
        jar.get(ACCESS_COOKIE_NAME).map(|c| c.value().to_string()),
        bearer_token(&headers).map(str::to_string),
        jar.get(REFRESH_COOKIE_NAME).map(|c| c.value().to_string()),
    ];

    let mut revoked = 0;
    for token in presented.into_iter().flatten() {
        if state.tokens.revoke(&token).await? {
            revoked += 1;
        }
    }
    info!("Sign-out revoked {} tokens", revoked);

    let jar = jar
        .remove(state.cookies.removal_cookie(ACCESS_COOKIE_NAME))
        .remove(state.cookies.removal_cookie(REFRESH_COOKIE_NAME));

    Ok((jar, Envelope::done("signed out")))
}
