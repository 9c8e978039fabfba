//! Canonical JSON serialization.
//!
//! Object keys are emitted in sorted order at every nesting level, so the
//! byte representation of equal values is equal regardless of how the value
//! was constructed or parsed. Arrays keep their order: array order is
//! semantically meaningful in item payloads.

use std::collections::BTreeMap;

use serde_json::Value;

/// Serializes a JSON value with recursively sorted object keys.
pub fn canonical_json(value: &Value) -> String {
    // Rebuilding through BTreeMap makes key ordering explicit rather than a
    // property of serde_json's default map type.
    let normalized = normalize(value);
    serde_json::to_string(&normalized).unwrap_or_else(|_| "null".to_string())
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, normalize(v))).collect();
            serde_json::to_value(sorted).unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}
