//! Parameter schemas attached to tool descriptors.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::registry::{ToolError, ToolResult};

/// Declared type of a tool parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Free text. Parameters declared without a type use this.
    #[default]
    String,
    /// Whole number.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ParamType {
    /// Returns the JSON Schema type keyword.
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// One named parameter of a tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamSpec {
    name: String,
    #[serde(rename = "type")]
    ty: ParamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    nullable: bool,
}

impl ParamSpec {
    /// Declares a parameter the caller must supply.
    #[must_use]
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            nullable: false,
        }
    }

    /// Declares a required free-text parameter.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::required(name, ParamType::String)
    }

    /// Declares an optional parameter with a default.
    ///
    /// A `null` default also makes the parameter nullable, widening its
    /// effective type to "`ty` or null".
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: ParamType, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            ty,
            nullable: default.is_null(),
            default: Some(default),
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn ty(&self) -> ParamType {
        self.ty
    }

    /// Returns `true` when the parameter has no default.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Returns the default value for optional parameters.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns `true` when `null` is an accepted value.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn json_schema(&self) -> Value {
        let mut property = Map::new();
        let ty = self.ty.json_type();
        if self.nullable {
            property.insert("type".into(), json!([ty, "null"]));
        } else {
            property.insert("type".into(), Value::from(ty));
        }
        if let Some(default) = &self.default {
            property.insert("default".into(), default.clone());
        }
        Value::Object(property)
    }
}

/// Ordered parameter list of one tool.
#[derive(Debug, PartialEq)]
pub struct ParamSchema {
    title: String,
    params: Vec<ParamSpec>,
}

static NO_ARGUMENTS: LazyLock<Arc<ParamSchema>> = LazyLock::new(|| {
    Arc::new(ParamSchema {
        title: "EmptyInput".into(),
        params: Vec::new(),
    })
});

impl ParamSchema {
    /// Returns the schema shared by every tool that takes no parameters.
    #[must_use]
    pub fn no_arguments() -> Arc<Self> {
        Arc::clone(&NO_ARGUMENTS)
    }

    /// Builds the schema for `tool_name`.
    ///
    /// An empty parameter list yields [`ParamSchema::no_arguments`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDescriptor`] if a parameter name is empty or
    /// declared twice.
    pub fn build(tool_name: &str, params: Vec<ParamSpec>) -> ToolResult<Arc<Self>> {
        if params.is_empty() {
            return Ok(Self::no_arguments());
        }

        let mut seen = BTreeSet::new();
        for param in &params {
            if param.name.trim().is_empty() {
                return Err(ToolError::InvalidDescriptor {
                    reason: format!("tool `{tool_name}` declares a parameter without a name"),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ToolError::InvalidDescriptor {
                    reason: format!(
                        "tool `{tool_name}` declares parameter `{}` twice",
                        param.name
                    ),
                });
            }
        }

        Ok(Arc::new(Self {
            title: format!("{}Input", title_case(tool_name)),
            params,
        }))
    }

    /// Returns the schema title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns `true` for the no-argument schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Renders the schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|param| (param.name.clone(), param.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|param| param.is_required())
            .map(ParamSpec::name)
            .collect();

        json!({
            "title": self.title,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Upper-cases the first letter of every alphabetic run, lower-casing the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
