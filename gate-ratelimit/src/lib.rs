//! Sliding-window rate limiting shared across processes.
//!
//! Every capability group owns a [`RateLimiter`] whose window lives in a
//! [`QuotaStore`]. The store is the only synchronisation point between callers:
//! purge, count, insert, and expiry refresh run as one atomic batch, and the
//! limiter suspends the calling task until the window has room.

#![warn(missing_docs, clippy::pedantic)]

mod clock;
mod error;
mod limiter;
mod policy;
mod store;

#[cfg(feature = "redis")]
mod redis_store;

pub use clock::{Clock, SystemClock, TokioClock};
pub use error::{QuotaError, QuotaResult};
pub use limiter::{RateLimiter, wait_seconds};
pub use policy::{DEFAULT_MAX_ATTEMPTS, RateLimitPolicy};
pub use store::{MemoryQuotaStore, QuotaStore};

#[cfg(feature = "redis")]
pub use redis_store::RedisQuotaStore;
