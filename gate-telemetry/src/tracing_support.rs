//! Structured tracing helpers.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor configuration provides one.
///
/// Transport crates are lowered to `warn` so request chatter does not drown
/// the tool audit trail.
pub const DEFAULT_FILTER: &str = "info,redis=warn,hyper=warn";

/// Parses filter directives.
///
/// # Errors
///
/// Returns an error if the directives are not a valid `EnvFilter`.
pub fn build_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter `{directives}`"))
}

/// Installs the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `configured`, which in turn overrides
/// [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber is
/// already installed.
pub fn init(configured: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(configured.unwrap_or(DEFAULT_FILTER))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::debug!("tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let filter = build_filter(DEFAULT_FILTER).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("redis=warn"));
        assert!(rendered.contains("hyper=warn"));
    }

    #[test]
    fn configured_filter_parses() {
        assert!(build_filter("debug,gate_ratelimit=trace").is_ok());
    }
}
