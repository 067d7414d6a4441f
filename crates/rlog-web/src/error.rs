//! Error types for the web interface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use rlog_engine::FilterError;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, WebError>;

/// Errors returned by the web interface.
#[derive(Debug, Error)]
pub enum WebError {
    /// Failed to bind to the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Query parameters did not form a valid filter.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "invalid_filter"),
            Self::BindFailed(_, _) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            error,
            message: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
