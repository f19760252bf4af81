//! Validation detail normalization
//!
//! Output shape: an object maps each field to either a list of strings or,
//! for nested resources, another normalized object. A top-level list
//! becomes a list of strings; any other value is wrapped in a one-element
//! list. Normalizing normalized output returns it unchanged.

use serde_json::{Map, Value};

/// Normalize validation errors into the `details` shape
pub fn normalize(errors: &Value) -> Value {
    match errors {
        Value::Object(fields) => Value::Object(normalize_fields(fields)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_item).collect()),
        other => Value::Array(vec![Value::String(stringify(other))]),
    }
}

fn normalize_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(field, errors)| {
            let normalized = match errors {
                Value::Object(nested) => Value::Object(normalize_fields(nested)),
                Value::Array(items) => Value::Array(items.iter().map(normalize_item).collect()),
                other => Value::Array(vec![Value::String(stringify(other))]),
            };
            (field.clone(), normalized)
        })
        .collect()
}

/// List entries stay strings, except per-item error objects of a nested list
fn normalize_item(item: &Value) -> Value {
    match item {
        Value::Object(nested) => Value::Object(normalize_fields(nested)),
        other => Value::String(stringify(other)),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
