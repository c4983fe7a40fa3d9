//! Observability utilities for toolgate.
//!
//! [`tracing_support`] installs the process-wide subscriber and [`metrics`]
//! provides an [`InvocationObserver`](gate_tools::InvocationObserver) that
//! aggregates per-tool timings.

#![warn(missing_docs, clippy::pedantic)]

pub mod metrics;
pub mod tracing_support;

pub use metrics::{Origin, ToolMetrics, ToolStats};
