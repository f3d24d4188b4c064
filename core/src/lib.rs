//! # geotally core
//!
//! The analysis pipeline: capture records are reduced to IPv4 address pairs,
//! eligible addresses are resolved to countries on a bounded worker pool, and
//! the per-packet attribution is aggregated into source and destination
//! distributions.

pub mod capture;
pub mod distribution;
pub mod extractor;
pub mod pipeline;
pub mod pool;
pub mod resolver;
