//! Error types for the rate limiter.

use thiserror::Error;

/// Errors surfaced by quota stores and rate limiters.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Policy parameters failed validation.
    #[error("invalid rate limit policy: {reason}")]
    InvalidPolicy {
        /// Human-readable reason for rejection.
        reason: String,
    },
    /// The quota store could not be reached when the limiter was created.
    #[error("quota store unreachable: {reason}")]
    Unreachable {
        /// Connection error reported by the store.
        reason: String,
    },
    /// The quota store failed while evaluating a window.
    #[error("quota store failure: {reason}")]
    Store {
        /// Error reported by the store backend.
        reason: String,
    },
    /// The window stayed full for more attempts than the policy allows.
    #[error("rate limit for `{key}` still exceeded after {attempts} attempts")]
    RetriesExhausted {
        /// Quota key that could not be acquired.
        key: String,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl QuotaError {
    /// Helper to construct store errors from string-like values.
    #[must_use]
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store {
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QuotaError {
    fn from(err: redis::RedisError) -> Self {
        Self::store(err.to_string())
    }
}

/// Result alias for quota operations.
pub type QuotaResult<T> = Result<T, QuotaError>;
