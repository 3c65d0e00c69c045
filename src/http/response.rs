//! Response envelopes for the assistance route.
//!
//! - 200 `{success: true, data}` wrapping the upstream payload untouched
//! - errors use the [`GatewayError`](crate::error::GatewayError) shapes
//! - `RateLimit-Limit`, `RateLimit-Remaining`, `RateLimit-Reset` on every
//!   reply, plus `Retry-After` on 429

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::AssistanceReply;
use crate::security::RateLimitInfo;

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Write the rate-limit disclosure headers.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo, rejected: bool) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(info.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(info.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(info.reset_secs()));
    if rejected {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(info.reset_secs()));
    }
}

impl IntoResponse for AssistanceReply {
    fn into_response(self) -> Response {
        let rejected = matches!(self.outcome, Err(crate::error::GatewayError::RateLimited(_)));
        let mut response = match self.outcome {
            Ok(data) => (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response(),
            Err(e) => e.into_response(),
        };
        apply_rate_limit_headers(response.headers_mut(), &self.rate_limit, rejected);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use std::time::Duration;

    fn info(remaining: u32) -> RateLimitInfo {
        RateLimitInfo {
            limit: 100,
            remaining,
            reset_after: Duration::from_millis(899_500),
        }
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = AssistanceReply {
            rate_limit: info(99),
            outcome: Ok(json!({ "answer": "Use Layer > New > Layer." })),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-limit"], "100");
        assert_eq!(response.headers()["ratelimit-remaining"], "99");
        assert_eq!(response.headers()["ratelimit-reset"], "900");
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "success": true, "data": { "answer": "Use Layer > New > Layer." } }));
    }

    #[test]
    fn test_rejection_carries_retry_after() {
        let response = AssistanceReply {
            rate_limit: info(0),
            outcome: Err(GatewayError::RateLimited(info(0))),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "900");
        assert_eq!(response.headers()["ratelimit-remaining"], "0");
        assert!(response.headers().get("x-ratelimit-limit").is_none());
    }
}
