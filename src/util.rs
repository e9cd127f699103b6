//! Shared utility helpers.

use serde_json::{Map, Value};

/// Set `key` to `value` when `cond` holds, otherwise remove `key`.
///
/// Every optional annotation property goes through this so that a default or
/// empty value is never stored.
#[inline]
pub fn set_or_remove(container: &mut Map<String, Value>, cond: bool, key: &str, value: Value) {
    if cond {
        container.insert(key.to_string(), value);
    } else {
        container.shift_remove(key);
    }
}

/// Set a text property, removing it when the text is empty.
#[inline]
pub fn set_text(container: &mut Map<String, Value>, key: &str, text: &str) {
    set_or_remove(container, !text.is_empty(), key, Value::String(text.to_string()));
}

/// Read a string property, treating an empty string as absent.
#[inline]
pub fn get_text<'a>(container: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    container
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Whether a JSON value counts as "empty" for set-or-delete purposes.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Apply `edit` to the nested object stored under `key`, creating it on
/// demand and removing it again if the edit leaves it empty.
pub fn edit_nested<R>(
    container: &mut Map<String, Value>,
    key: &str,
    edit: impl FnOnce(&mut Map<String, Value>) -> R,
) -> R {
    if !container.contains_key(key) {
        let mut nested = Map::new();
        let result = edit(&mut nested);
        if !nested.is_empty() {
            container.insert(key.to_string(), Value::Object(nested));
        }
        return result;
    }

    let (result, now_empty) = match container.get_mut(key) {
        Some(Value::Object(nested)) => {
            let result = edit(nested);
            (result, nested.is_empty())
        }
        // not an object; leave it alone and edit a scratch map instead
        _ => return edit(&mut Map::new()),
    };
    if now_empty {
        container.shift_remove(key);
    }
    result
}
