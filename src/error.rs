//! Gateway error taxonomy and its HTTP mapping.
//!
//! Every terminal failure of the assistance pipeline is one of these
//! variants, each with a stable JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::pipeline::validator::Violation;
use crate::security::RateLimitInfo;
use crate::upstream::UpstreamError;

/// Message returned with every 429.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Errors that end an assistance request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request-local input problems. Not a server fault.
    #[error("invalid request: {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// Client exceeded its admission window. Not a server fault.
    #[error("rate limit exceeded")]
    RateLimited(RateLimitInfo),

    /// Request body larger than the listener allows. Not a server fault.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The inference service failed or timed out.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Defect in the gateway itself. Detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream(e) => e.http_status(),
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            GatewayError::Validation(violations) => json!({ "errors": violations }),
            GatewayError::RateLimited(_) => json!({
                "success": false,
                "message": RATE_LIMIT_MESSAGE,
            }),
            GatewayError::PayloadTooLarge { .. } => json!({
                "success": false,
                "message": self.to_string(),
                "error": "payload_too_large",
            }),
            GatewayError::Upstream(e) => json!({
                "success": false,
                "message": e.to_string(),
                "error": e.kind(),
            }),
            GatewayError::Internal(_) => json!({
                "success": false,
                "message": "Internal server error",
                "error": "internal_error",
            }),
        };
        (status, Json(body)).into_response()
    }
}
