//! Assistance Gateway Library
//!
//! Accepts a context/question pair, rate-limits and validates it, forwards
//! it to the inference service and records per-outcome latency.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::Pipeline;
