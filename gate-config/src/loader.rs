//! Configuration loader implementations.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::schema::GatewayConfig;

/// Overrides `quota_store.host`.
pub const ENV_REDIS_HOST: &str = "TOOLGATE_REDIS_HOST";
/// Overrides `quota_store.port`.
pub const ENV_REDIS_PORT: &str = "TOOLGATE_REDIS_PORT";
/// Overrides `quota_store.db`.
pub const ENV_REDIS_DB: &str = "TOOLGATE_REDIS_DB";
/// Overrides `logging.filter`.
pub const ENV_LOG: &str = "TOOLGATE_LOG";

/// Parses a TOML document and validates every limit section.
///
/// Environment overrides are not applied.
///
/// # Errors
///
/// Fails on malformed TOML, unknown keys, or an invalid limit section.
pub fn parse(text: &str) -> Result<GatewayConfig> {
    let config: GatewayConfig = toml::from_str(text).context("failed to parse configuration")?;
    validate(&config)?;
    Ok(config)
}

/// Reads `path`, parses it, and applies the process environment.
///
/// # Errors
///
/// Fails if the file cannot be read, does not parse, or an override is invalid.
pub fn load(path: &Path) -> Result<GatewayConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration `{}`", path.display()))?;
    let mut config =
        parse(&text).with_context(|| format!("in configuration `{}`", path.display()))?;
    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    info!(path = %path.display(), limits = config.limits.len(), "configuration loaded");
    Ok(config)
}

/// Loads `path` when given, otherwise starts from the defaults.
///
/// Environment overrides apply in both cases.
///
/// # Errors
///
/// See [`load`].
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig> {
    if let Some(path) = path {
        return load(path);
    }
    let mut config = GatewayConfig::default();
    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    debug!("no configuration file, using defaults");
    Ok(config)
}

/// Applies `TOOLGATE_*` overrides read through `lookup`.
///
/// # Errors
///
/// Fails when a numeric override does not parse.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_REDIS_HOST) {
        config.quota_store.host = host;
    }
    if let Some(port) = lookup(ENV_REDIS_PORT) {
        config.quota_store.port = port
            .trim()
            .parse()
            .with_context(|| format!("{ENV_REDIS_PORT}=`{port}` is not a port"))?;
    }
    if let Some(db) = lookup(ENV_REDIS_DB) {
        config.quota_store.db = db
            .trim()
            .parse()
            .with_context(|| format!("{ENV_REDIS_DB}=`{db}` is not a database index"))?;
    }
    if let Some(filter) = lookup(ENV_LOG) {
        config.logging.filter = Some(filter);
    }
    Ok(())
}

fn validate(config: &GatewayConfig) -> Result<()> {
    for namespace in config.limits.keys() {
        config.policy(namespace)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SAMPLE: &str = r#"
[quota_store]
host = "localhost"

[logging]
filter = "debug"

[registry]
reject_duplicates = true

[limits.finnhub]
max_requests = 50
interval_seconds = 60
principal = "analyst"

[limits.quotes]
max_requests = 2
interval_seconds = 1
max_attempts = 5
"#;

    #[test]
    fn parses_full_document() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.quota_store.url(), "redis://localhost:6379/0");
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
        assert!(config.registry.reject_duplicates);
        assert_eq!(config.limits.len(), 2);

        let quotes = config.policy("quotes").unwrap();
        assert_eq!(quotes.key().to_string(), "quotes:global");
        assert_eq!(quotes.max_attempts(), 5);
    }

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(parse("").unwrap(), GatewayConfig::default());
    }

    #[test]
    fn rejects_invalid_documents() {
        assert!(parse("[quota_store]\nhots = \"typo\"").is_err());
        assert!(parse("[limits.finnhub]\nmax_requests = 0\ninterval_seconds = 60").is_err());
        assert!(parse("[limits.finnhub]\nmax_requests = 5").is_err());
    }

    #[test]
    fn environment_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_REDIS_HOST, "cache.internal"),
            (ENV_REDIS_PORT, "6380"),
            (ENV_REDIS_DB, "2"),
            (ENV_LOG, "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = parse(SAMPLE).unwrap();
        apply_overrides(&mut config, |name| env.get(name).map(|v| (*v).to_owned())).unwrap();

        assert_eq!(config.quota_store.url(), "redis://cache.internal:6380/2");
        assert_eq!(config.logging.filter.as_deref(), Some("warn"));
    }

    #[test]
    fn invalid_override_is_an_error() {
        let mut config = GatewayConfig::default();
        let err = apply_overrides(&mut config, |name| {
            (name == ENV_REDIS_PORT).then(|| "not-a-port".to_owned())
        })
        .expect_err("port must be numeric");
        assert!(err.to_string().contains(ENV_REDIS_PORT));
    }
}
