//! Uniform JSON response envelope
//!
//! Every endpoint answers `{"status": "ok" | "fail", "message": ..., "body": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub message: String,
    pub body: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// Successful response carrying a body
    pub fn ok(message: impl Into<String>, body: T) -> Self {
        Self {
            status: "ok",
            message: message.into(),
            body: Some(body),
        }
    }
}

impl Envelope<()> {
    /// Successful response without a body
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            status: "ok",
            message: message.into(),
            body: None,
        }
    }

    /// Failure response
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: message.into(),
            body: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
