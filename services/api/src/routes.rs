//! API service routes

use auth::session_middleware;
use axum::{Router, middleware};

use crate::state::AppState;

pub mod shops;
pub mod users;

/// Create the router for the API service
///
/// Everything is served under `/api/v1`. Authentication endpoints are
/// public; user and shop endpoints sit behind the session middleware.
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .merge(users::router())
        .merge(shops::router())
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            session_middleware,
        ))
        .with_state(state.clone());

    let api = auth::routes::create_router(state.auth).merge(protected_routes);

    Router::new().nest("/api/v1", api)
}
