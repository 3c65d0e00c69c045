//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (latency histogram, counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log events of a request
//! - Metrics are cheap (atomic increments)
//! - The pipeline records latency through a trait so tests can count
//!   observations

pub mod logging;
pub mod metrics;

pub use self::metrics::{LatencyRecorder, Outcome, PrometheusLatency};
