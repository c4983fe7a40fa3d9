//! Tool name sanitisation.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Applying the function to its own output returns the same string.
#[must_use]
pub fn sanitize_tool_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Identifier under which a tool is exposed to callers.
///
/// Always matches `^[A-Za-z0-9_-]+$`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Sanitises a declared operation name into a tool name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] if the declared name is empty.
    pub fn sanitize(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidToolName {
                name: String::new(),
                reason: "name cannot be empty".into(),
            });
        }
        Ok(Self(sanitize_tool_name(raw)))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ToolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ToolName> for String {
    fn from(value: ToolName) -> Self {
        value.0
    }
}
