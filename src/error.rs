//! Error types for the gateway core
//!
//! Provides unified error handling using thiserror.
//!
//! Persistence problems (snapshot file load/save failures) are deliberately
//! not part of this enum: the last-request store degrades gracefully and
//! reports them as `tracing::warn` events instead of failing the request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Gateway Error Enum ==
/// Unified error type for the caching and replay core.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Parameter set could not be canonically serialized for fingerprinting
    #[error("Parameter encoding failed: {0}")]
    Encoding(String),

    /// Request payload does not match the shape expected by the endpoint
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Endpoint identifier has no registered handler
    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    /// No stored request exists (or it has expired) for the given scope
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to see the requested stored request
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller identity is missing from the request
    #[error("Missing caller identity")]
    Unauthorized,

    /// The wrapped report fetch operation failed
    #[error("Upstream query failed: {0}")]
    Upstream(String),

    /// Internal invariant violation (e.g. bad wiring at startup)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Encoding(_) => StatusCode::BAD_REQUEST,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedEndpoint(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway core.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                GatewayError::Encoding("x".into()).into_response().status(),
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::UnsupportedEndpoint("x".into())
                    .into_response()
                    .status(),
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::NotFound("x".into()).into_response().status(),
                StatusCode::NOT_FOUND,
            ),
            (
                GatewayError::Forbidden("x".into()).into_response().status(),
                StatusCode::FORBIDDEN,
            ),
            (
                GatewayError::Unauthorized.into_response().status(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                GatewayError::Upstream("x".into()).into_response().status(),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (got, want) in cases {
            assert_eq!(got, want);
        }
    }
}
