//! Metrics collection and exposition.
//!
//! # Metrics
//! - `assistance_request_duration_seconds` (histogram, `status` = success|error):
//!   one observation per request that passed admission control
//! - `assistance_rate_limited_total` (counter): admission rejections
//! - `assistance_upstream_failures_total` (counter, `reason`): upstream failures
//!
//! Rejected requests are counted, not timed: they say nothing about
//! pipeline latency.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const ASSISTANCE_LATENCY: &str = "assistance_request_duration_seconds";
pub const RATE_LIMITED: &str = "assistance_rate_limited_total";
pub const UPSTREAM_FAILURES: &str = "assistance_upstream_failures_total";

/// Histogram buckets for assistance latency, in seconds.
pub const LATENCY_BUCKETS: &[f64] = &[0.1, 0.3, 0.5, 0.7, 1.0, 2.0, 5.0];

/// Final outcome label of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

/// Sink for latency observations.
pub trait LatencyRecorder: Send + Sync {
    fn observe(&self, outcome: Outcome, elapsed: Duration);
}

/// Records into the process-wide `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusLatency;

impl LatencyRecorder for PrometheusLatency {
    fn observe(&self, outcome: Outcome, elapsed: Duration) {
        histogram!(ASSISTANCE_LATENCY, "status" => outcome.as_str()).record(elapsed.as_secs_f64());
    }
}

/// Install the Prometheus recorder as the global `metrics` recorder.
///
/// The returned handle renders the exposition text for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;

    describe_histogram!(ASSISTANCE_LATENCY, Unit::Seconds, "Duration of assistance requests in seconds");
    describe_counter!(RATE_LIMITED, "Assistance requests rejected by admission control");
    describe_counter!(UPSTREAM_FAILURES, "Failed calls to the inference service");

    Ok(handle)
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(Matcher::Full(ASSISTANCE_LATENCY.to_string()), LATENCY_BUCKETS)
}

pub fn record_rate_limited() {
    counter!(RATE_LIMITED).increment(1);
}

pub fn record_upstream_failure(reason: &'static str) {
    counter!(UPSTREAM_FAILURES, "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Error.as_str(), "error");
    }

    #[test]
    fn test_exposition_labels_and_buckets() {
        let recorder = builder().unwrap().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            PrometheusLatency.observe(Outcome::Error, Duration::from_millis(250));
            record_rate_limited();
            record_upstream_failure("timeout");
            record_upstream_failure("timeout");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"assistance_upstream_failures_total{reason="timeout"} 2"#));
        assert!(rendered.contains("assistance_rate_limited_total 1"));
        assert!(rendered.contains(r#"assistance_request_duration_seconds_bucket{status="error",le="0.3"} 1"#));
        assert!(rendered.contains(r#"assistance_request_duration_seconds_bucket{status="error",le="0.1"} 0"#));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        PrometheusLatency.observe(Outcome::Success, Duration::from_millis(120));
        record_rate_limited();
        record_upstream_failure("timeout");
    }
}
