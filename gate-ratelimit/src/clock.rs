//! Time sources for window arithmetic.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Supplies the current time in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time, truncated to seconds.
    fn now_secs(&self) -> u64;
}

/// Wall clock; every process sharing a quota store must agree on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// Clock that advances with tokio's timer, starting from a fixed epoch second.
///
/// Under a paused runtime the reported time follows the virtual clock, so
/// window waits are observable without real sleeping.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_secs: u64,
    origin: Instant,
}

impl TokioClock {
    /// Creates a clock that reports `origin_secs` now and advances from there.
    #[must_use]
    pub fn starting_at(origin_secs: u64) -> Self {
        Self {
            origin_secs,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now_secs(&self) -> u64 {
        self.origin_secs + self.origin.elapsed().as_secs()
    }
}
