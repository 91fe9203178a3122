//! Response normalization
//!
//! APIs wrap their lists inconsistently: `[..]`, `{"users": [..]}`,
//! `{"user": [..]}`, `{"data": [..]}`. The root of a decoded body is found
//! with a fixed precedence, first match wins:
//!
//! 1. the declared root key (dotted keys walk nested maps)
//! 2. the singular of the declared root key
//! 3. with no declared root, the snake_cased namespace (non-null values only)
//! 4. the value of a map holding exactly one entry
//! 5. the body itself
//!
//! Anything but a non-empty array at that point yields no records.

use crate::inflect::{singular, snake_case};
use serde_json::{Map, Value};

/// Turn a decoded body into the ordered list of raw records it holds
pub fn normalize(
    body: Option<Value>,
    root: Option<&str>,
    namespace: Option<&str>,
) -> Vec<Map<String, Value>> {
    let Some(body) = body else {
        return Vec::new();
    };

    match discover_root(body, root, namespace) {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                other => {
                    tracing::warn!("Skipping non-object element in response: {}", other);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Unwrap the body down to the value holding the records
pub fn discover_root(body: Value, root: Option<&str>, namespace: Option<&str>) -> Value {
    let mut map = match body {
        Value::Object(map) => map,
        other => return other,
    };

    if let Some(root) = root {
        if let Some(value) = lookup(&map, root) {
            return value.clone();
        }
        if let Some(value) = lookup(&map, &singular(root)) {
            return value.clone();
        }
    } else if let Some(namespace) = namespace {
        let key = snake_case(namespace);
        if map.get(&key).is_some_and(|value| !value.is_null()) {
            if let Some(value) = map.remove(&key) {
                return value;
            }
        }
    }

    if map.len() == 1 {
        if let Some((_, value)) = map.into_iter().next() {
            return value;
        }
        return Value::Null;
    }

    Value::Object(map)
}

/// Look up a key in a map, walking dotted paths when no literal key matches
///
/// Path segments that parse as numbers index into arrays.
pub fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    if !key.contains('.') {
        return None;
    }

    let mut parts = key.split('.');
    let mut current = map.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(inner) => inner.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Same as [`lookup`], starting from any JSON value
pub fn lookup_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|map| lookup(map, key))
}
