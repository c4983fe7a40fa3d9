//! Strongly typed configuration schemas.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use gate_primitives::{DEFAULT_PRINCIPAL, QuotaKey};
use gate_ratelimit::RateLimitPolicy;
use serde::Deserialize;

/// Root of a `toolgate.toml` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Connection settings of the shared quota store.
    pub quota_store: QuotaStoreConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
    /// Tool registry settings.
    pub registry: RegistryConfig,
    /// Rate limit sections keyed by capability namespace.
    pub limits: BTreeMap<String, LimitConfig>,
}

impl GatewayConfig {
    /// Returns the raw limit section for `namespace`.
    #[must_use]
    pub fn limit(&self, namespace: &str) -> Option<&LimitConfig> {
        self.limits.get(namespace)
    }

    /// Builds the validated rate limit policy of `namespace`.
    ///
    /// # Errors
    ///
    /// Fails when the namespace has no `[limits.<namespace>]` section or the
    /// section describes an invalid key or policy.
    pub fn policy(&self, namespace: &str) -> Result<RateLimitPolicy> {
        let limit = self
            .limit(namespace)
            .ok_or_else(|| anyhow!("no rate limit configured for `{namespace}`"))?;
        limit
            .policy(namespace)
            .with_context(|| format!("invalid rate limit for `{namespace}`"))
    }
}

/// Location of the Redis instance backing the sliding windows.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaStoreConfig {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Logical database index.
    pub db: u32,
}

impl Default for QuotaStoreConfig {
    fn default() -> Self {
        Self {
            host: "redis_mcp".into(),
            port: 6379,
            db: 0,
        }
    }
}

impl QuotaStoreConfig {
    /// Renders the connection URL, e.g. `redis://redis_mcp:6379/0`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Logging section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    pub filter: Option<String>,
}

/// Registry section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Fail the registry build on colliding tool names.
    pub reject_duplicates: bool,
}

/// One `[limits.<namespace>]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitConfig {
    /// Admissions allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub interval_seconds: u64,
    /// Principal sharing the window; defaults to `global`.
    #[serde(default)]
    pub principal: Option<String>,
    /// Upper bound on acquisition attempts.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl LimitConfig {
    /// Builds the policy for `namespace`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid namespace or principal, or on zero limits.
    pub fn policy(&self, namespace: &str) -> Result<RateLimitPolicy> {
        let principal = self.principal.as_deref().unwrap_or(DEFAULT_PRINCIPAL);
        let key = QuotaKey::new(namespace, principal)?;
        let policy = RateLimitPolicy::new(key, self.max_requests, self.interval_seconds)?;
        match self.max_attempts {
            Some(attempts) => Ok(policy.with_max_attempts(attempts)?),
            None => Ok(policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finnhub() -> LimitConfig {
        LimitConfig {
            max_requests: 50,
            interval_seconds: 60,
            principal: Some("analyst".into()),
            max_attempts: None,
        }
    }

    #[test]
    fn store_defaults_point_at_shared_redis() {
        let store = QuotaStoreConfig::default();
        assert_eq!(store.url(), "redis://redis_mcp:6379/0");
    }

    #[test]
    fn builds_policy_from_limit_section() {
        let mut config = GatewayConfig::default();
        config.limits.insert("finnhub".into(), finnhub());

        let policy = config.policy("finnhub").unwrap();
        assert_eq!(policy.key().to_string(), "finnhub:analyst");
        assert_eq!(policy.max_requests(), 50);
        assert_eq!(policy.interval_seconds(), 60);
    }

    #[test]
    fn principal_defaults_to_global() {
        let limit = LimitConfig {
            principal: None,
            max_attempts: Some(3),
            ..finnhub()
        };
        let policy = limit.policy("finnhub").unwrap();
        assert_eq!(policy.key().principal(), DEFAULT_PRINCIPAL);
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn rejects_unknown_namespace_and_invalid_limits() {
        let config = GatewayConfig::default();
        assert!(config.policy("finnhub").is_err());

        let zero = LimitConfig {
            max_requests: 0,
            ..finnhub()
        };
        assert!(zero.policy("finnhub").is_err());
        assert!(finnhub().policy("bad:namespace").is_err());
    }
}
