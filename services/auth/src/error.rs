//! Authentication and authorization errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use thiserror::Error;
use tracing::error;

use crate::{response::Envelope, tokens::TokenError};

/// Custom error type for authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, invalid or expired credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid identity without the required rights, or a blocked account
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl AuthError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AuthError::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        error!("Credential store failure: {}", err);
        AuthError::InternalServerError
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        if err.is_rejection() {
            return AuthError::Unauthorized;
        }
        error!("Token service failure: {}", err);
        AuthError::InternalServerError
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::Unauthorized => "Unauthorized".to_string(),
            AuthError::Forbidden(msg) | AuthError::BadRequest(msg) => msg.clone(),
            AuthError::InternalServerError => "Internal server error".to_string(),
        };

        (self.status(), axum::Json(Envelope::fail(message))).into_response()
    }
}
