//! Middleware resolving the session for protected routes

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    cookies::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, bearer_token},
    error::AuthError,
    models::User,
    state::AuthState,
};

/// The authenticated user, inserted into request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the acting user from cookies or the `Authorization` header.
///
/// Access tokens are tried from the `access_token` cookie first, then from a
/// bearer header, so a stale cookie does not hide a valid header. The
/// refresh token only comes from its cookie. When the session was kept
/// alive by rotation the new access token is set on the response.
pub async fn session_middleware(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let cookie_token = jar.get(ACCESS_COOKIE_NAME).map(|cookie| cookie.value());
    let header_token = bearer_token(req.headers());
    let mut access_tokens: Vec<&str> = cookie_token.into_iter().collect();
    if let Some(token) = header_token.filter(|token| Some(*token) != cookie_token) {
        access_tokens.push(token);
    }
    let refresh_token = jar.get(REFRESH_COOKIE_NAME).map(|cookie| cookie.value());

    let session = state
        .sessions
        .resolve_candidates(&access_tokens, refresh_token)
        .await?;

    req.extensions_mut().insert(CurrentUser(session.user));

    let response = next.run(req).await;

    match session.rotated_access_token {
        Some(token) => {
            let jar = CookieJar::new().add(state.cookies.token_cookie(ACCESS_COOKIE_NAME, token));
            Ok((jar, response).into_response())
        }
        None => Ok(response),
    }
}
