//! Overlaying partial updates onto a StructuredNeed snapshot.
//!
//! Last write wins. Arrays replace wholesale, plain objects merge key by key,
//! `null` in the update leaves the base untouched.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{NeedCanvasError, Result};
use crate::need::StructuredNeed;

/// Recursively overlays `update` onto `dest` in place.
///
/// A non-object `update` replaces `dest` outright (unless it is `null`).
pub fn merge_json(dest: &mut Value, update: &Value) {
    match update {
        Value::Null => {}
        Value::Object(source) => {
            if !dest.is_object() {
                *dest = Value::Object(Map::new());
            }
            if let Value::Object(target) = dest {
                assign(target, source);
            }
        }
        other => *dest = other.clone(),
    }
}

fn assign(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Null => continue,
            Value::Array(_) => {
                target.insert(key.clone(), value.clone());
            }
            Value::Object(_) => {
                let slot = target.entry(key.clone()).or_insert(Value::Null);
                merge_json(slot, value);
            }
            scalar => {
                target.insert(key.clone(), scalar.clone());
            }
        }
    }
}

/// Returns `current` with `update` overlaid.
///
/// An absent update is the identity. An update whose merged tree no longer
/// fits the model is rejected as a whole with a validation error.
pub fn merge_structured_need(
    current: &StructuredNeed,
    update: Option<&Value>,
) -> Result<StructuredNeed> {
    let Some(update) = update else {
        return Ok(current.clone());
    };
    if !update.is_object() {
        return Err(NeedCanvasError::validation(format!(
            "structured need update must be an object, got {}",
            json_kind(update)
        )));
    }
    let mut tree = serde_json::to_value(current)?;
    merge_json(&mut tree, update);
    serde_json::from_value(tree).map_err(|e| {
        NeedCanvasError::validation(format!("update does not fit the structured need: {e}"))
    })
}

/// Merge that never fails: a rejected update is logged and the base kept.
pub fn merge_or_keep(current: &StructuredNeed, update: Option<&Value>) -> StructuredNeed {
    match merge_structured_need(current, update) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(error = %e, "dropping structured need update");
            current.clone()
        }
    }
}

/// PHP `array_replace_recursive` semantics, used by the legacy session state.
///
/// Objects and lists both merge position by position, a list merged with an
/// object becomes an index-keyed object; every other value in the
/// replacement, `null` included, overwrites.
pub fn replace_recursive(dest: &mut Value, replacement: &Value) {
    match (dest, replacement) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                replace_entry(target, key.clone(), value);
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (idx, value) in source.iter().enumerate() {
                if idx < target.len() {
                    let slot = &mut target[idx];
                    if is_container(slot) && is_container(value) {
                        replace_recursive(slot, value);
                    } else {
                        *slot = value.clone();
                    }
                } else {
                    target.push(value.clone());
                }
            }
        }
        (Value::Object(target), Value::Array(source)) => {
            for (idx, value) in source.iter().enumerate() {
                replace_entry(target, idx.to_string(), value);
            }
        }
        (slot, Value::Object(source)) if slot.is_array() => {
            let items = match std::mem::take(slot) {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            let mut target: Map<String, Value> = items
                .into_iter()
                .enumerate()
                .map(|(idx, value)| (idx.to_string(), value))
                .collect();
            for (key, value) in source {
                replace_entry(&mut target, key.clone(), value);
            }
            *slot = Value::Object(target);
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn replace_entry(target: &mut Map<String, Value>, key: String, value: &Value) {
    let descend = target.get(&key).is_some_and(is_container) && is_container(value);
    match target.get_mut(&key) {
        Some(slot) if descend => replace_recursive(slot, value),
        _ => {
            target.insert(key, value.clone());
        }
    }
}

fn is_container(v: &Value) -> bool {
    v.is_object() || v.is_array()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
