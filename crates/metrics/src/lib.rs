//! Metrics collection and export for moltis.
//!
//! Metric names live in per-subsystem modules so every crate records under
//! the same names. Recording goes through the `metrics` facade; with no
//! recorder installed it is a no-op.
//!
//! ```rust,ignore
//! use moltis_metrics::{counter, labels, routing};
//!
//! counter!(routing::REPLY_TARGET_RESOLVED_TOTAL, labels::RULE => "originating_to").increment(1);
//! ```
//!
//! # Features
//!
//! - `prometheus`: install a Prometheus recorder and render the text format

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
