//! Recursive object merge used when importing profiles over a prototype.

use serde_json::{Map, Value};

/// Merge `overlay` onto `base`.
///
/// Objects present on both sides are merged recursively. Any other value in
/// `overlay` (arrays included) replaces the base value outright.
pub fn deep_merge(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut result = base.clone();
    for (key, value) in overlay {
        let merged = match (result.get(key), value) {
            (Some(Value::Object(b)), Value::Object(o)) => Value::Object(deep_merge(b, o)),
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}
