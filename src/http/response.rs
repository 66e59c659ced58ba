//! Response construction for requests the proxy answers itself.
//!
//! # Design Decisions
//! - Backend connection failures result in 502 Bad Gateway
//! - Backend timeouts result in 504 Gateway Timeout
//! - Unknown hosts result in 404 Not Found

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure to obtain a response from a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("backend request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("could not build backend request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Upstream(_) | ForwardError::InvalidRequest(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match self.status() {
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

/// Response for hosts without a routing entry.
pub fn no_route() -> Response {
    (StatusCode::NOT_FOUND, "No matching route found").into_response()
}
