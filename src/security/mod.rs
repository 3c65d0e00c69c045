//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming assistance request:
//!     → rate_limit.rs (per-client fixed window, first pipeline stage)
//!     → pipeline continues
//!
//! Every outgoing response:
//!     → headers.rs (OWASP security headers)
//! ```
//!
//! # Design Decisions
//! - Admission control runs before any request-local work
//! - Rate windows live in a shared concurrent map, evicted by a sweeper
//! - Only the standard `RateLimit-*` disclosure headers, no legacy variants

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Admission, AdmissionControl, FixedWindowLimiter, RateLimitInfo};
