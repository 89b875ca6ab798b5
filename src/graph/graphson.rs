//! GraphSON 2.0 decoding.
//!
//! Gremlin servers speaking GraphSON 2.0 wrap typed values as
//! `{"@type": "g:Int64", "@value": 5}`. [`untype`] strips those wrappers so
//! callers get plain JSON.

use serde_json::{Map, Value as JsonValue};

const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "@value";

/// Recursively removes GraphSON type wrappers from a value.
pub fn untype(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut object) if is_typed(&object) => {
            let type_name = object.remove(TYPE_KEY);
            let inner = object.remove(VALUE_KEY).unwrap_or(JsonValue::Null);
            match type_name.as_ref().and_then(JsonValue::as_str) {
                Some("g:Map") => untype_map(inner),
                _ => untype(inner),
            }
        }
        JsonValue::Object(object) => JsonValue::Object(
            object
                .into_iter()
                .map(|(key, value)| (key, untype(value)))
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(untype).collect()),
        scalar => scalar,
    }
}

fn is_typed(object: &Map<String, JsonValue>) -> bool {
    object.len() == 2 && object.contains_key(TYPE_KEY) && object.contains_key(VALUE_KEY)
}

/// `g:Map` stores entries as a flat `[k1, v1, k2, v2, ...]` array.
fn untype_map(inner: JsonValue) -> JsonValue {
    let JsonValue::Array(items) = inner else {
        return untype(inner);
    };

    let mut object = Map::with_capacity(items.len() / 2);
    let mut entries = items.into_iter();
    while let Some(key) = entries.next() {
        let value = entries.next().map(untype).unwrap_or(JsonValue::Null);
        let key = match untype(key) {
            JsonValue::String(s) => s,
            other => other.to_string(),
        };
        object.insert(key, value);
    }
    JsonValue::Object(object)
}
