//! Assistance pipeline orchestration.
//!
//! ```text
//! Received → RateChecked → Validated → UpstreamInvoked → Completed
//!               │              │
//!               └─ rejected ───┴─ invalid ──────────────→ Completed
//! ```
//!
//! The stages after admission run on their own task: a client that
//! disconnects drops only the waiting handler, the stages still finish
//! and the latency observation is still recorded.
//!
//! The body size limit is enforced here, after admission, so oversized
//! requests still spend a slot of the client's window.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap};
use futures_util::{FutureExt, StreamExt};
use serde_json::Value;
use tracing::Instrument;

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::observability::{LatencyRecorder, Outcome};
use crate::pipeline::validator::{self, Violation};
use crate::security::{Admission, AdmissionControl, RateLimitInfo};
use crate::upstream::Inference;

/// Terminal result of one assistance request.
#[derive(Debug)]
pub struct AssistanceReply {
    /// Limit disclosure, present on every reply.
    pub rate_limit: RateLimitInfo,
    /// Upstream payload or the error that ended the request.
    pub outcome: Result<Value, GatewayError>,
}

/// Rate limiter → validator → upstream client, with latency recording.
#[derive(Clone)]
pub struct Pipeline {
    limiter: Arc<dyn AdmissionControl>,
    upstream: Arc<dyn Inference>,
    latency: Arc<dyn LatencyRecorder>,
    max_body_bytes: usize,
}

impl Pipeline {
    pub fn new(
        limiter: Arc<dyn AdmissionControl>,
        upstream: Arc<dyn Inference>,
        latency: Arc<dyn LatencyRecorder>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            limiter,
            upstream,
            latency,
            max_body_bytes,
        }
    }

    /// Run one request from `client` through the pipeline.
    pub async fn handle(&self, client: &str, request: Request) -> AssistanceReply {
        let started = Instant::now();

        let rate_limit = match self.limiter.admit(client) {
            Admission::Admitted(info) => info,
            Admission::Rejected(info) => {
                tracing::warn!(client = %client, limit = info.limit, "Rate limit exceeded");
                metrics::record_rate_limited();
                return AssistanceReply {
                    rate_limit: info,
                    outcome: Err(GatewayError::RateLimited(info)),
                };
            }
        };

        let pipeline = self.clone();
        let task = tokio::spawn(
            async move {
                let outcome = match AssertUnwindSafe(pipeline.run_stages(request)).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(GatewayError::Internal(panic_message(panic.as_ref()))),
                };
                pipeline.finish(&outcome, started);
                outcome
            }
            .in_current_span(),
        );

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Only reachable when the runtime cancels the task.
                let outcome = Err(GatewayError::Internal(e.to_string()));
                self.finish(&outcome, started);
                outcome
            }
        };

        AssistanceReply { rate_limit, outcome }
    }

    async fn run_stages(&self, request: Request) -> Result<Value, GatewayError> {
        let (parts, body) = request.into_parts();

        // Only JSON bodies are parsed; anything else validates as `{}`.
        let raw = if is_json(&parts.headers) {
            let bytes = read_body(body, self.max_body_bytes).await?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Value::Object(Default::default())
            } else {
                serde_json::from_slice(&bytes)
                    .map_err(|e| GatewayError::Validation(vec![Violation::malformed_body(e)]))?
            }
        } else {
            tracing::debug!("Ignoring non-JSON request body");
            Value::Object(Default::default())
        };

        let request = validator::validate(&raw).map_err(GatewayError::Validation)?;

        let payload = self.upstream.infer(&request).await.map_err(|e| {
            tracing::warn!(reason = e.reason(), status = %e.http_status(), error = %e, "Upstream call failed");
            metrics::record_upstream_failure(e.reason());
            GatewayError::Upstream(e)
        })?;

        Ok(payload)
    }

    /// Record the single latency observation and log the outcome.
    fn finish(&self, outcome: &Result<Value, GatewayError>, started: Instant) {
        let elapsed = started.elapsed();
        let label = match outcome {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Error,
        };
        self.latency.observe(label, elapsed);

        match outcome {
            Ok(_) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Assistance request completed"),
            Err(GatewayError::Validation(violations)) => {
                tracing::debug!(violations = violations.len(), "Assistance request rejected by validation")
            }
            Err(GatewayError::PayloadTooLarge { limit }) => {
                tracing::debug!(limit = *limit, "Assistance request body too large")
            }
            Err(GatewayError::Internal(detail)) => {
                tracing::error!(error = %detail, "Assistance pipeline failed unexpectedly")
            }
            Err(_) => {}
        }
    }
}

/// `application/json`, with or without parameters.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Collect the body, failing as soon as it grows past `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, GatewayError> {
    let mut stream = body.into_data_stream();
    let mut bytes = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GatewayError::Validation(vec![Violation::malformed_body(e)]))?;
        if bytes.len() + chunk.len() > limit {
            return Err(GatewayError::PayloadTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("pipeline panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("pipeline panicked: {}", s)
    } else {
        "pipeline panicked".to_string()
    }
}
