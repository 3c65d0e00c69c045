//! Typed client for the assistance gateway.

pub mod client;

pub use client::{AskOutcome, FieldViolation, GatewayClient};
