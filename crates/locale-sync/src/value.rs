//! Shape helpers for localization trees.
//!
//! Trees are plain `serde_json::Value`s. The crate enables serde_json's
//! `preserve_order` feature, so object keys keep their insertion order from
//! parse through to serialization.

use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// The variant a JSON value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

/// Returns the map when `value` is a plain object (never an array or null).
pub fn as_plain_object(value: &Value) -> Option<&JsonObject> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Keys of `source` in their order, followed by keys only `target` has, in
/// target order.
pub fn ordered_key_union<'a>(source: &'a JsonObject, target: &'a JsonObject) -> Vec<&'a str> {
    let mut keys: Vec<&str> = source.keys().map(String::as_str).collect();
    keys.extend(target.keys().map(String::as_str).filter(|key| !source.contains_key(*key)));
    keys
}

pub(crate) fn join_key_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() { key.to_string() } else { format!("{prefix}.{key}") }
}
