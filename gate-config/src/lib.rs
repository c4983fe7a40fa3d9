//! Configuration management for toolgate.
//!
//! [`schema`] holds the strongly typed TOML layout and [`loader`] reads it,
//! applies `TOOLGATE_*` environment overrides, and validates every rate limit
//! section before handing the configuration out.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{load, load_or_default, parse};
pub use schema::{GatewayConfig, LimitConfig, LoggingConfig, QuotaStoreConfig, RegistryConfig};
