//! Declared tool schemas
//!
//! Each tool's parameters are declared once as a static spec; the same
//! declaration produces the JSON Schema advertised by `tools/list` and
//! drives argument validation, so the two can never drift apart.

use serde_json::{json, Map, Value};

use gdocs_core::{Error, Result};

pub const MAX_RESULTS_CEILING: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    /// A string that must be present and non-empty after trimming.
    NonEmptyString,
    /// An optional string; when present it must be non-empty.
    String,
    /// An integer bounded to `1..=MAX_RESULTS_CEILING`.
    BoundedInteger,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    /// JSON Schema object advertised for this tool.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in self.params {
            let schema = match param.kind {
                ParamKind::NonEmptyString | ParamKind::String => json!({
                    "type": "string",
                    "description": param.description,
                }),
                ParamKind::BoundedInteger => json!({
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_CEILING,
                    "description": param.description,
                }),
            };
            properties.insert(param.name.to_string(), schema);
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check `arguments` against the declared parameters. Unknown keys are
    /// ignored so clients can send extra fields without breaking.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let object = match arguments {
            Value::Null => return self.check_required_present(&Map::new()),
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidParameters(format!(
                    "arguments must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        self.check_required_present(object)?;

        for param in self.params {
            let Some(value) = object.get(param.name) else {
                continue;
            };
            match param.kind {
                ParamKind::NonEmptyString | ParamKind::String => {
                    let Some(s) = value.as_str() else {
                        return Err(Error::InvalidParameters(format!(
                            "'{}' must be a string, got {}",
                            param.name,
                            type_name(value)
                        )));
                    };
                    if s.trim().is_empty() {
                        return Err(Error::InvalidParameters(format!(
                            "'{}' must not be empty",
                            param.name
                        )));
                    }
                }
                ParamKind::BoundedInteger => {
                    let Some(n) = value.as_u64() else {
                        return Err(Error::InvalidParameters(format!(
                            "'{}' must be a positive integer, got {}",
                            param.name,
                            type_name(value)
                        )));
                    };
                    if n < 1 || n > MAX_RESULTS_CEILING {
                        return Err(Error::InvalidParameters(format!(
                            "'{}' must be between 1 and {}",
                            param.name, MAX_RESULTS_CEILING
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn check_required_present(&self, object: &Map<String, Value>) -> Result<()> {
        for param in self.params.iter().filter(|p| p.required) {
            if !object.contains_key(param.name) {
                return Err(Error::InvalidParameters(format!(
                    "missing required parameter '{}'",
                    param.name
                )));
            }
        }
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validated-argument accessors. Only call these after `validate` passed.
pub fn str_arg<'a>(arguments: &'a Value, name: &str) -> Option<&'a str> {
    arguments.get(name).and_then(|v| v.as_str())
}

pub fn usize_arg(arguments: &Value, name: &str, default: usize) -> usize {
    arguments
        .get(name)
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: ToolSpec = ToolSpec {
        name: "example",
        description: "example tool",
        params: &[
            ParamSpec {
                name: "query",
                kind: ParamKind::NonEmptyString,
                required: true,
                description: "search text",
            },
            ParamSpec {
                name: "max_results",
                kind: ParamKind::BoundedInteger,
                required: false,
                description: "result cap",
            },
        ],
    };

    #[test]
    fn test_schema_lists_required_params() {
        let schema = SPEC.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["query"]));
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["max_results"]["maximum"], 100);
    }

    #[test]
    fn test_valid_arguments_pass() {
        let args = serde_json::json!({"query": "roadmap", "max_results": 5});
        assert!(SPEC.validate(&args).is_ok());
    }

    #[test]
    fn test_missing_required_param_rejected() {
        let err = SPEC.validate(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_null_arguments_rejected_when_param_required() {
        let err = SPEC.validate(&Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
    }

    #[test]
    fn test_empty_string_rejected() {
        let err = SPEC.validate(&serde_json::json!({"query": "  "})).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_wrong_type_rejected_with_type_name() {
        let err = SPEC.validate(&serde_json::json!({"query": 42})).unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_out_of_bounds_integer_rejected() {
        let args = serde_json::json!({"query": "x", "max_results": 101});
        assert!(SPEC.validate(&args).is_err());
        let args = serde_json::json!({"query": "x", "max_results": 0});
        assert!(SPEC.validate(&args).is_err());
        let args = serde_json::json!({"query": "x", "max_results": -3});
        assert!(SPEC.validate(&args).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let args = serde_json::json!({"query": "x", "color": "blue"});
        assert!(SPEC.validate(&args).is_ok());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = SPEC.validate(&serde_json::json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_accessors_with_defaults() {
        let args = serde_json::json!({"query": "x"});
        assert_eq!(str_arg(&args, "query"), Some("x"));
        assert_eq!(str_arg(&args, "folder_id"), None);
        assert_eq!(usize_arg(&args, "max_results", 10), 10);
        let args = serde_json::json!({"max_results": 7});
        assert_eq!(usize_arg(&args, "max_results", 10), 7);
    }
}
