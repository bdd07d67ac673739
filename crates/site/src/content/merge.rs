//! Right-biased merge of a locale override onto default content.
//!
//! Rules, applied per key of the default object:
//!
//! - a value whose JSON kind differs from the default's is skipped;
//! - arrays are replaced wholesale, and only by a non-empty array;
//! - objects are spread (`{...default, ...override}`), so their own
//!   children are replaced rather than merged;
//! - scalars are replaced.
//!
//! Paths listed as deep keys (`"hero.metrics"`) get one more level of the
//! same treatment instead of being replaced by the spread. Nothing deeper is
//! merged.

use serde_json::{Map, Value};

/// Merge `overlay` onto `base`, honouring `deep_keys`.
///
/// `base` is returned unchanged when either side is not an object.
#[must_use]
pub fn merge_content(base: &Value, overlay: &Value, deep_keys: &[&str]) -> Value {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return base.clone();
    };

    let mut merged = base_map.clone();
    for (key, value) in overlay_map {
        let replacement = match base_map.get(key) {
            Some(Value::Object(base_child)) => match value {
                Value::Object(overlay_child) => Some(Value::Object(spread(base_child, overlay_child))),
                _ => mismatch(key),
            },
            Some(base_value) => replace(key, base_value, value),
            None => Some(value.clone()),
        };
        if let Some(replacement) = replacement {
            merged.insert(key.clone(), replacement);
        }
    }

    for path in deep_keys {
        merge_deep_key(&mut merged, base_map, overlay_map, path);
    }

    Value::Object(merged)
}

/// `{...base, ...overlay}` with the array and kind rules applied per key.
fn spread(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let replacement = match base.get(key) {
            Some(base_value) => replace(key, base_value, value),
            None => Some(value.clone()),
        };
        if let Some(replacement) = replacement {
            merged.insert(key.clone(), replacement);
        }
    }
    merged
}

fn replace(key: &str, base: &Value, overlay: &Value) -> Option<Value> {
    if !same_kind(base, overlay) {
        return mismatch(key);
    }
    match overlay {
        Value::Array(items) if items.is_empty() => None,
        _ => Some(overlay.clone()),
    }
}

fn mismatch(key: &str) -> Option<Value> {
    tracing::warn!(key, "Override value has the wrong shape, keeping default");
    None
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Null, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

/// Re-merge the object at `path` one level deep.
fn merge_deep_key(
    merged: &mut Map<String, Value>,
    base: &Map<String, Value>,
    overlay: &Map<String, Value>,
    path: &str,
) {
    let Some((parent, child)) = path.split_once('.') else {
        return;
    };

    let Some(Value::Object(base_child)) = base.get(parent).and_then(|v| v.get(child)) else {
        return;
    };
    let Some(Value::Object(overlay_child)) = overlay.get(parent).and_then(|v| v.get(child)) else {
        return;
    };
    let Some(Value::Object(merged_parent)) = merged.get_mut(parent) else {
        return;
    };

    merged_parent.insert(
        child.to_owned(),
        Value::Object(spread(base_child, overlay_child)),
    );
}
