//! Assistance request pipeline.
//!
//! # Data Flow
//! ```text
//! POST /api/assistance
//!     → security::rate_limit (admit or 429, no latency observation)
//!     → validator.rs (trim, non-empty, length; 400 with every violation)
//!     → upstream::client (POST /infer, 10s deadline)
//!     → orchestrator.rs records one latency observation (success|error)
//! ```
//!
//! # Design Decisions
//! - Cheapest check first after admission control
//! - Validation is a pure function
//! - Panics in a stage become a generic 500, never a dropped connection

pub mod orchestrator;
pub mod validator;

pub use orchestrator::{AssistanceReply, Pipeline};
pub use validator::{AssistanceRequest, Rule, Violation};
