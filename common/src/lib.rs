//! Shared domain types for geotally.
//!
//! Everything in here is pure data or pure functions: addresses and their
//! classification, packet address pairs, country attribution, run configuration
//! and the error taxonomy shared by the core pipeline and the CLI.

pub mod config;
pub mod error;
pub mod log;
pub mod network;

#[doc(hidden)]
pub use tracing;
