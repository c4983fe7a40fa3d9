//! Shared error definitions for toolgate primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Quota key component failed validation.
    #[error("invalid quota key `{key}`: {reason}")]
    InvalidQuotaKey {
        /// The offending key text.
        key: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name could not be turned into an identifier.
    #[error("invalid tool name `{name}`: {reason}")]
    InvalidToolName {
        /// The raw name as declared by the provider.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
