//! Structural validation of a request body against a resource's JSON Schema.
//!
//! Schemas are compiled with the `jsonschema` crate and cached per schema
//! text. Each compiled error is translated into the Ed-Fi wording and
//! attributed to the concrete JSON path of the offending value.

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::json_path::value_to_string;
use crate::types::ValidationFailures;
use crate::validation::formats;

/// One path-addressed validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Collapses an ordered error list into the path -> messages report
pub fn into_failures(errors: Vec<ValidationError>) -> ValidationFailures {
    errors.into_iter().map(|e| (e.path, e.message)).collect()
}

pub trait DocumentValidator: Send + Sync {
    /// Empty result means the body is valid
    fn validate(&self, schema: &Value, body: &Value) -> Vec<ValidationError>;
}

/// Removes object properties whose value is `null`, at any depth.
/// A null is treated the same as an absent property.
pub fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for child in map.values_mut() {
                prune_nulls(child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prune_nulls(item);
            }
        }
        _ => {}
    }
}

type CompiledSchemas = HashMap<String, Option<Arc<Validator>>>;

/// Validator backed by compiled `jsonschema` validators. A schema that fails
/// to compile is logged once and then skipped.
#[derive(Default, Clone)]
pub struct JsonSchemaDocumentValidator {
    compiled: Arc<Mutex<CompiledSchemas>>,
}

impl JsonSchemaDocumentValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, schema: &Value) -> Option<Arc<Validator>> {
        let key = schema.to_string();
        let mut cache = match self.compiled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache
            .entry(key)
            .or_insert_with(|| match compile(schema) {
                Ok(validator) => Some(Arc::new(validator)),
                Err(e) => {
                    tracing::error!("Resource JSON Schema does not compile, skipping validation: {}", e);
                    None
                }
            })
            .clone()
    }
}

/// Date, date-time and time use the same lenient parsers as coercion
fn compile(schema: &Value) -> Result<Validator, String> {
    jsonschema::options()
        .should_validate_formats(true)
        .with_format("date", |value: &str| formats::parse_iso_date(value).is_some())
        .with_format("date-time", |value: &str| formats::parse_date_time(value).is_some())
        .with_format("time", |value: &str| formats::parse_time(value).is_some())
        .build(schema)
        .map_err(|e| e.to_string())
}

impl DocumentValidator for JsonSchemaDocumentValidator {
    fn validate(&self, schema: &Value, body: &Value) -> Vec<ValidationError> {
        let Some(validator) = self.compiled(schema) else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        let mut blank = HashSet::new();
        blank_required_strings(schema, body, "$", &mut blank, &mut errors);

        for error in validator.iter_errors(body) {
            let pointer = error.instance_path.to_string();
            let (path, name) = json_path_of(&pointer, body);
            if blank.contains(&path) {
                continue;
            }

            match &error.kind {
                ValidationErrorKind::AdditionalProperties { unexpected } => {
                    for key in unexpected {
                        errors.push(ValidationError::new(
                            format!("{}.{}", path, key),
                            format!("{} is an overposted property and is not allowed.", key),
                        ));
                    }
                }
                ValidationErrorKind::Required { property } => {
                    let key = value_to_string(property);
                    errors.push(ValidationError::new(
                        format!("{}.{}", path, key),
                        format!("{} is required.", key),
                    ));
                }
                kind => {
                    let instance = body.pointer(&pointer).unwrap_or(&Value::Null);
                    let keyword = schema.pointer(&error.schema_path.to_string());
                    let message = match kind {
                        ValidationErrorKind::Type { .. } => format!(
                            "Value is \"{}\" but should be \"{}\"",
                            json_type_name(instance),
                            keyword.map(expected_type_name).unwrap_or_else(|| "valid".to_string())
                        ),
                        ValidationErrorKind::Enum { .. } => {
                            "Value should match one of the values specified by the enum".to_string()
                        }
                        ValidationErrorKind::MinLength { limit } => {
                            format!("Value should be at least {} characters", limit)
                        }
                        ValidationErrorKind::MaxLength { limit } => {
                            format!("Value should be at most {} characters", limit)
                        }
                        ValidationErrorKind::MinItems { limit } => {
                            format!("Value should have at least {} items", limit)
                        }
                        ValidationErrorKind::MaxItems { limit } => {
                            format!("Value should have at most {} items", limit)
                        }
                        ValidationErrorKind::Minimum { limit } => {
                            format!("Value should be greater than or equal to {}", limit)
                        }
                        ValidationErrorKind::Maximum { limit } => {
                            format!("Value should be less than or equal to {}", limit)
                        }
                        ValidationErrorKind::UniqueItems => "Value should have unique items".to_string(),
                        ValidationErrorKind::Format { format } => {
                            format!("Value does not match format \"{}\"", format)
                        }
                        ValidationErrorKind::Pattern { .. } => pattern_message(instance).to_string(),
                        _ => error.to_string(),
                    };
                    errors.push(ValidationError::new(path, prefixed(&name, message)));
                }
            }
        }
        errors
    }
}

/// Required string properties holding only whitespace get one message and
/// no further keyword errors. Walks `properties` and `items` only.
fn blank_required_strings(
    schema: &Value,
    value: &Value,
    path: &str,
    blank: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        Value::Object(map) => {
            let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                return;
            };
            let required: Vec<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            for (key, property_schema) in properties {
                let Some(child) = map.get(key) else {
                    continue;
                };
                let child_path = format!("{}.{}", path, key);
                if required.contains(&key.as_str()) && is_blank_string(child) {
                    errors.push(ValidationError::new(
                        child_path.clone(),
                        format!("{} is required and should not be left empty.", key),
                    ));
                    blank.insert(child_path);
                } else {
                    blank_required_strings(property_schema, child, &child_path, blank, errors);
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, index);
                    blank_required_strings(item_schema, item, &item_path, blank, errors);
                }
            }
        }
        _ => {}
    }
}

/// JSON Pointer (`/a/0/b`) to JSON path (`$.a[0].b`), plus the nearest
/// property name. Numeric segments are indexes only when the body holds an
/// array at that point.
fn json_path_of(pointer: &str, body: &Value) -> (String, String) {
    let mut path = "$".to_string();
    let mut name = String::new();
    let mut current = Some(body);

    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        match (current, segment.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(index)) => {
                path.push_str(&format!("[{}]", index));
                current = items.get(index);
            }
            (node, _) => {
                path.push('.');
                path.push_str(&segment);
                current = node.and_then(|n| n.get(segment.as_str()));
                name = segment;
            }
        }
    }
    (path, name)
}

fn pattern_message(instance: &Value) -> &'static str {
    let text = instance.as_str().unwrap_or_default();
    if text.trim().is_empty() {
        "is required and should not be left empty."
    } else if text.trim() != text {
        "cannot contain leading or trailing spaces."
    } else {
        "does not match the required pattern."
    }
}

fn prefixed(name: &str, message: String) -> String {
    if name.is_empty() {
        message
    } else {
        format!("{} {}", name, message)
    }
}

fn is_blank_string(value: &Value) -> bool {
    value.as_str().map(|s| s.trim().is_empty()).unwrap_or(false)
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false),
        _ => false,
    }
}

fn expected_type_name(expected: &Value) -> String {
    match expected {
        Value::String(t) => t.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_integer(value) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
