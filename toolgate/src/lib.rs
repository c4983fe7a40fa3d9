//! Rate-limited tool gateway facade.
//!
//! Bundles the toolgate crates behind feature flags so downstream users can
//! enable only the components they need. The Redis-backed quota store is
//! behind the `redis` feature.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use gate_primitives as primitives;

/// Sliding-window rate limiting (enabled by `ratelimit` feature).
#[cfg(feature = "ratelimit")]
pub use gate_ratelimit as ratelimit;

/// Tool registry and dispatch (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use gate_tools as tools;

/// Tracing setup and invocation metrics (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use gate_telemetry as telemetry;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use gate_config as config;
