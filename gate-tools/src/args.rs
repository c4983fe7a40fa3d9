//! Argument validation and coercion against a parameter schema.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::registry::{ToolError, ToolResult};
use crate::schema::{ParamSchema, ParamSpec, ParamType};

/// Arguments that passed schema validation.
///
/// Every declared parameter is present: supplied values are coerced to the
/// declared type and absent optional parameters carry their default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Validates raw caller input against `schema`.
    ///
    /// `null` counts as "no arguments". Names the schema does not declare are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the input is not an object, a
    /// required parameter is missing, or a value cannot be coerced.
    pub fn validate(schema: &ParamSchema, input: Value) -> ToolResult<Self> {
        let mut supplied = match input {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "expected an object of named arguments, got {}",
                    kind(&other)
                )));
            }
        };

        let mut validated = Map::new();
        for param in schema.params() {
            let value = match supplied.remove(param.name()) {
                Some(value) => coerce(param, value)?,
                None => match param.default_value() {
                    Some(default) => default.clone(),
                    None => {
                        return Err(ToolError::invalid_arguments(format!(
                            "missing required parameter `{}`",
                            param.name()
                        )));
                    }
                },
            };
            validated.insert(param.name().to_owned(), value);
        }

        if !supplied.is_empty() {
            let ignored: Vec<&String> = supplied.keys().collect();
            debug!(?ignored, "dropping undeclared tool arguments");
        }

        Ok(Self(validated))
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string parameter, or `None` if absent or not a string.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns an integer parameter, or `None` if absent or not an integer.
    #[must_use]
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Deserialises the arguments into a typed structure.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the arguments do not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> ToolResult<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|err| ToolError::invalid_arguments(err.to_string()))
    }

    /// Returns `true` if no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the arguments, returning them as a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn coerce(param: &ParamSpec, value: Value) -> ToolResult<Value> {
    if value.is_null() {
        if param.is_nullable() {
            return Ok(Value::Null);
        }
        return Err(mismatch(param, &value));
    }

    let coerced = match (param.ty(), value) {
        (ParamType::String, value @ Value::String(_))
        | (ParamType::Boolean, value @ Value::Bool(_))
        | (ParamType::Array, value @ Value::Array(_))
        | (ParamType::Object, value @ Value::Object(_))
        | (ParamType::Number, value @ Value::Number(_)) => Some(value),
        (ParamType::Integer, Value::Number(number)) => integer_from_number(&number),
        (ParamType::Integer, Value::String(text)) => text.trim().parse::<i64>().ok().map(Value::from),
        (ParamType::Number, Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (ParamType::Boolean, Value::String(text)) => match text.trim().to_ascii_lowercase().as_str()
        {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (ParamType::Boolean, Value::Number(number)) => match number.as_u64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        (_, value) => return Err(mismatch(param, &value)),
    };

    coerced.ok_or_else(|| {
        ToolError::invalid_arguments(format!(
            "parameter `{}` expects {}",
            param.name(),
            param.ty().json_type()
        ))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integer_from_number(number: &Number) -> Option<Value> {
    if number.is_i64() || number.is_u64() {
        return Some(Value::Number(number.clone()));
    }
    let float = number.as_f64()?;
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Some(Value::from(float as i64))
    } else {
        None
    }
}

fn mismatch(param: &ParamSpec, value: &Value) -> ToolError {
    ToolError::invalid_arguments(format!(
        "parameter `{}` expects {}, got {}",
        param.name(),
        param.ty().json_type(),
        kind(value)
    ))
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
