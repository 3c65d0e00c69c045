//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM/SIGINT → shutdown.rs broadcast
//!     → HTTP server stops accepting, drains in-flight requests
//!     → rate window sweeper exits
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
