//! Error types for the feed proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key has expired
    #[error("Key expired: {0}")]
    Expired(String),

    /// Key or value rejected by the store limits
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Fetch Error Enum ==
/// Transport failures of the outbound upstream request.
///
/// A non-200 status is not a `FetchError`; it comes back as a regular
/// response so the caller decides what counts as success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request exceeded its timeout
    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    /// Connection, TLS or body read failure
    #[error("Upstream request failed: {0}")]
    Network(String),
}

// == Shape Error Enum ==
/// Errors raised while turning upstream JSON into table data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Required `data.headers` or `data.rows` missing or of the wrong type
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

// == Proxy Error Enum ==
/// Errors surfaced to HTTP callers of the proxy and admin endpoints.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Upstream unreachable, timed out or answered with a non-200 status
    #[error("Invalid URL")]
    InvalidUrl,

    /// Upstream answered 200 but the body was unusable
    #[error("Connect to Strategy11 remote endpoint failed.")]
    InvalidStory,

    /// A cached payload could no longer be shaped
    #[error("Cached data could not be read: {0}")]
    MalformedCache(String),

    /// Caller is not allowed to run an administrative action
    #[error("You do not have permission to do this.")]
    Forbidden,
}

impl ProxyError {
    /// Machine-readable error code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl => "rest_invalid_url",
            ProxyError::InvalidStory => "rest_invalid_story",
            ProxyError::MalformedCache(_) => "rest_malformed_cache",
            ProxyError::Forbidden => "rest_forbidden",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidUrl | ProxyError::InvalidStory => StatusCode::NOT_FOUND,
            ProxyError::Forbidden => StatusCode::FORBIDDEN,
            ProxyError::MalformedCache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        // Admin actions answer in the `{success, message}` envelope
        let body = match &self {
            ProxyError::Forbidden => Json(json!({
                "success": false,
                "message": message,
            })),
            _ => Json(json!({
                "code": self.code(),
                "message": message,
                "data": { "status": status.as_u16() },
            })),
        };

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for request handling.
pub type Result<T> = std::result::Result<T, ProxyError>;
