//! Application state shared across handlers

use std::sync::Arc;

use auth::AuthState;

use crate::repositories::ShopStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub shops: Arc<dyn ShopStore>,
}
