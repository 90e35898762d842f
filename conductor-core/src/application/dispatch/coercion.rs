//! Converts string-valued model arguments into the JSON types a tool's input
//! schema declares.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Build the `arguments` object for `tools/call`.
///
/// Returns a human-readable reason on failure.
pub fn coerce_arguments(
    schema: &Value,
    arguments: &BTreeMap<String, String>,
) -> Result<Value, String> {
    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = schema
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .map(|allowed| !allowed)
        .unwrap_or(false);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        let missing: Vec<&str> = required
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| !arguments.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required argument(s): {}", missing.join(", ")));
        }
    }

    let mut coerced = Map::new();
    for (name, raw) in arguments {
        let declared = properties.and_then(|props| props.get(name));
        let value = match declared {
            Some(property) => coerce_value(property, raw).map_err(|expected| {
                format!("argument '{name}' expects {expected}, got \"{raw}\"")
            })?,
            None if closed => return Err(format!("unexpected argument '{name}'")),
            None => Value::String(raw.clone()),
        };
        coerced.insert(name.clone(), value);
    }
    Ok(Value::Object(coerced))
}

fn coerce_value(property: &Value, raw: &str) -> Result<Value, String> {
    let candidates = declared_types(property);
    if candidates.is_empty() {
        return Ok(Value::String(raw.to_string()));
    }
    candidates
        .iter()
        .find_map(|kind| coerce_as(kind, raw))
        .ok_or_else(|| candidates.join(" or "))
}

/// Types named by `type` (string or list) or by `anyOf`/`oneOf` branches.
fn declared_types(property: &Value) -> Vec<String> {
    match property.get("type") {
        Some(Value::String(kind)) => return vec![kind.clone()],
        Some(Value::Array(kinds)) => {
            return kinds
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
        _ => {}
    }
    ["anyOf", "oneOf"]
        .iter()
        .filter_map(|key| property.get(*key).and_then(Value::as_array))
        .flatten()
        .flat_map(declared_types)
        .collect()
}

fn coerce_as(kind: &str, raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    match kind {
        "string" => Some(Value::String(raw.to_string())),
        "number" => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        "integer" => trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                    .map(|value| value as i64)
            })
            .map(|value| Value::Number(value.into())),
        "boolean" => {
            if trimmed.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        "null" => {
            (trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")).then_some(Value::Null)
        }
        "object" => serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_object),
        "array" => serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_array),
        _ => Some(Value::String(raw.to_string())),
    }
}
