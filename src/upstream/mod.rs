//! Upstream inference service subsystem.
//!
//! # Data Flow
//! ```text
//! AssistanceRequest (validated)
//!     → client.rs (POST <base_url>/infer, 10s deadline)
//!     → Ok(payload) | Err(UpstreamError)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; the call always has a deadline
//! - No raw transport error crosses this boundary
//! - Timed-out calls are reported as 504 Gateway Timeout
//! - The pipeline depends on the `Inference` trait, not the concrete client

pub mod client;

pub use client::{Inference, UpstreamClient, UpstreamError};
