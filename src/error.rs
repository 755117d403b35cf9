//! Error types for the forwarding proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Proxy Error Enum ==
/// Unified error type for the forwarding proxy.
///
/// Errors are `Clone` so that a single failed dispatch can be handed to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Target URL missing or empty
    #[error("Missing target URL")]
    MissingTarget,

    /// Target URL could not be parsed as an absolute http(s) URL
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    /// Malformed inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend answered with a non-2xx status
    #[error("Backend responded with status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Backend body was not valid JSON
    #[error("Backend returned invalid JSON: {0}")]
    Parse(String),

    /// Network failure or timeout reaching the backend
    #[error("Backend request failed: {0}")]
    Transport(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// True for errors caused by the inbound request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProxyError::MissingTarget
                | ProxyError::InvalidTarget(_)
                | ProxyError::InvalidRequest(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Backend status is never passed through
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the forwarding proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
