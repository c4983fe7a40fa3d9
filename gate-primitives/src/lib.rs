//! Core shared types for the toolgate capability invocation layer.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod name;
mod outcome;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Sliding-window identifier shared by every caller of a capability group.
pub use ids::{DEFAULT_PRINCIPAL, QuotaKey};
/// Externally addressable tool names.
pub use name::{ToolName, sanitize_tool_name};
/// Two-outcome contract produced by every wrapped operation.
pub use outcome::InvocationResult;
