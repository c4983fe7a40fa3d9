//! Quota key types.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Principal used when a capability group is shared by every caller.
pub const DEFAULT_PRINCIPAL: &str = "global";

/// Identifier of one sliding window: `{namespace}:{principal}`.
///
/// The namespace names a capability group (usually one upstream API) and may
/// not contain `:`, so two namespaces can never produce the same key.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct QuotaKey {
    namespace: String,
    principal: String,
}

impl QuotaKey {
    /// Creates a key for the supplied namespace and principal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuotaKey`] if either component is empty or the
    /// namespace contains the `:` separator.
    pub fn new(namespace: impl Into<String>, principal: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let principal = principal.into();

        if namespace.trim().is_empty() {
            return Err(Error::InvalidQuotaKey {
                key: format!("{namespace}:{principal}"),
                reason: "namespace cannot be empty".into(),
            });
        }
        if namespace.contains(':') {
            return Err(Error::InvalidQuotaKey {
                key: format!("{namespace}:{principal}"),
                reason: "namespace cannot contain `:`".into(),
            });
        }
        if principal.trim().is_empty() {
            return Err(Error::InvalidQuotaKey {
                key: format!("{namespace}:{principal}"),
                reason: "principal cannot be empty".into(),
            });
        }

        Ok(Self {
            namespace,
            principal,
        })
    }

    /// Creates a key shared by every caller of the namespace.
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuotaKey::new`].
    pub fn global(namespace: impl Into<String>) -> Result<Self> {
        Self::new(namespace, DEFAULT_PRINCIPAL)
    }

    /// Returns the capability group namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the caller principal.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

impl Display for QuotaKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_namespace_and_principal() {
        let key = QuotaKey::new("finnhub_api", "alice").expect("key");
        assert_eq!(key.to_string(), "finnhub_api:alice");
    }

    #[test]
    fn global_key_uses_default_principal() {
        let key = QuotaKey::global("weather").expect("key");
        assert_eq!(key.principal(), DEFAULT_PRINCIPAL);
        assert_eq!(key.to_string(), "weather:global");
    }

    #[test]
    fn rejects_separator_in_namespace() {
        let err = QuotaKey::new("a:b", "c").expect_err("separator");
        assert!(matches!(err, Error::InvalidQuotaKey { .. }));
    }

    #[test]
    fn rejects_empty_components() {
        assert!(QuotaKey::new("", "alice").is_err());
        assert!(QuotaKey::new("spotify", " ").is_err());
    }
}
