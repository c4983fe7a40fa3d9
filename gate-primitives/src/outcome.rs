//! Invocation results returned by capability operations.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome reported by a wrapped operation: a payload or a diagnostic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum InvocationResult {
    /// The operation completed and produced a payload.
    Success(Value),
    /// The operation reported a business failure.
    Failure(String),
}

impl InvocationResult {
    /// Creates a successful result from any JSON-convertible payload.
    #[must_use]
    pub fn success(payload: impl Into<Value>) -> Self {
        Self::Success(payload.into())
    }

    /// Creates a failed result carrying the supplied diagnostic.
    #[must_use]
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self::Failure(diagnostic.into())
    }

    /// Returns `true` for [`InvocationResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T, E> From<Result<T, E>> for InvocationResult
where
    T: Into<Value>,
    E: Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}
