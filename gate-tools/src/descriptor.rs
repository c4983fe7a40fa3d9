//! Capability descriptors built once per registered operation.

use std::sync::Arc;

use gate_primitives::ToolName;
use serde_json::{Value, json};

use crate::registry::ToolResult;
use crate::schema::{ParamSchema, ParamSpec};

/// Description used when an operation carries no documentation.
pub const NO_DESCRIPTION: &str = "No description provided.";

/// Name, description, and parameter schema of one tool.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDescriptor {
    name: ToolName,
    declared_name: String,
    description: String,
    schema: Arc<ParamSchema>,
}

impl ToolDescriptor {
    /// Builds a descriptor for an operation declared as `declared_name`.
    ///
    /// The description is kept verbatim; a missing or blank description is
    /// replaced by [`NO_DESCRIPTION`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDescriptor`](crate::ToolError::InvalidDescriptor)
    /// if the name is empty or the parameter list is malformed.
    pub fn new(
        declared_name: &str,
        description: Option<&str>,
        params: Vec<ParamSpec>,
    ) -> ToolResult<Self> {
        let name = ToolName::sanitize(declared_name)?;
        let schema = ParamSchema::build(name.as_str(), params)?;
        let description = description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_owned();

        Ok(Self {
            name,
            declared_name: declared_name.to_owned(),
            description,
            schema,
        })
    }

    /// Returns the sanitised tool name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the name as declared by the provider.
    #[must_use]
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameter schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<ParamSchema> {
        &self.schema
    }

    /// Renders the schema as JSON Schema.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        self.schema.to_json_schema()
    }

    /// Renders the function definition handed to the caller.
    #[must_use]
    pub fn definition(&self) -> Value {
        json!({
            "name": self.name.as_str(),
            "description": self.description,
            "parameters": self.json_schema(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolError;
    use crate::schema::ParamType;

    #[test]
    fn missing_description_uses_placeholder() {
        let descriptor = ToolDescriptor::new("crypto_exchanges", None, Vec::new()).unwrap();
        assert_eq!(descriptor.description(), NO_DESCRIPTION);

        let descriptor = ToolDescriptor::new("crypto_exchanges", Some("  \n"), Vec::new()).unwrap();
        assert_eq!(descriptor.description(), "No description provided.");
    }

    #[test]
    fn description_is_kept_verbatim() {
        let text = "Get the current stock price.\n\nParameters:\n- symbol (str)";
        let descriptor = ToolDescriptor::new("company_quote", Some(text), vec![ParamSpec::text("symbol")])
            .unwrap();
        assert_eq!(descriptor.description(), text);
        assert_ne!(descriptor.description(), NO_DESCRIPTION);
    }

    #[test]
    fn sanitises_declared_name() {
        let descriptor = ToolDescriptor::new("market.status", None, Vec::new()).unwrap();
        assert_eq!(descriptor.name().as_str(), "market_status");
        assert_eq!(descriptor.declared_name(), "market.status");
    }

    #[test]
    fn zero_parameter_descriptors_share_schema() {
        let a = ToolDescriptor::new("current_time", None, Vec::new()).unwrap();
        let b = ToolDescriptor::new("crypto_exchanges", None, Vec::new()).unwrap();
        assert!(Arc::ptr_eq(a.schema(), b.schema()));
    }

    #[test]
    fn definition_carries_schema() {
        let descriptor = ToolDescriptor::new(
            "market_news",
            Some("Latest headlines"),
            vec![ParamSpec::optional("category", ParamType::String, "general")],
        )
        .unwrap();
        let definition = descriptor.definition();
        assert_eq!(definition["name"], "market_news");
        assert_eq!(definition["parameters"]["properties"]["category"]["default"], "general");
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = ToolDescriptor::new("", None, Vec::new()).expect_err("empty");
        assert!(matches!(err, ToolError::InvalidDescriptor { .. }));
    }
}
