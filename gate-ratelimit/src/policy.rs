//! Immutable rate limit policies.

use std::num::{NonZeroU32, NonZeroU64};

use gate_primitives::QuotaKey;

use crate::error::{QuotaError, QuotaResult};

/// Number of window evaluations a single `acquire` may perform before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

const DEFAULT_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(DEFAULT_MAX_ATTEMPTS) {
    Some(attempts) => attempts,
    None => panic!("default attempt count must be non-zero"),
};

/// Quota enforced by one [`RateLimiter`](crate::RateLimiter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    key: QuotaKey,
    max_requests: NonZeroU32,
    interval_seconds: NonZeroU64,
    max_attempts: NonZeroU32,
}

impl RateLimitPolicy {
    /// Creates a policy admitting `max_requests` per `interval_seconds` window.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidPolicy`] if either limit is zero.
    pub fn new(key: QuotaKey, max_requests: u32, interval_seconds: u64) -> QuotaResult<Self> {
        let max_requests = NonZeroU32::new(max_requests).ok_or_else(|| QuotaError::InvalidPolicy {
            reason: "max_requests must be positive".into(),
        })?;
        let interval_seconds =
            NonZeroU64::new(interval_seconds).ok_or_else(|| QuotaError::InvalidPolicy {
                reason: "interval_seconds must be positive".into(),
            })?;

        Ok(Self {
            key,
            max_requests,
            interval_seconds,
            max_attempts: DEFAULT_ATTEMPTS,
        })
    }

    /// Overrides the number of window evaluations per `acquire` call.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::InvalidPolicy`] if `max_attempts` is zero.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> QuotaResult<Self> {
        self.max_attempts = NonZeroU32::new(max_attempts).ok_or_else(|| QuotaError::InvalidPolicy {
            reason: "max_attempts must be positive".into(),
        })?;
        Ok(self)
    }

    /// Returns the quota key shared by every caller of this policy.
    #[must_use]
    pub fn key(&self) -> &QuotaKey {
        &self.key
    }

    /// Returns the number of admissions allowed per window.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests.get()
    }

    /// Returns the window width in seconds.
    #[must_use]
    pub const fn interval_seconds(&self) -> u64 {
        self.interval_seconds.get()
    }

    /// Returns the iteration guard for a single `acquire` call.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }
}
