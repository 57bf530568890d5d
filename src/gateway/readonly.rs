//! Read-only guard for document-store filters.

use serde_json::{Map, Value};

/// Operators that write data or run server-side code.
const DISALLOWED_OPERATORS: &[&str] = &[
    "$set",
    "$unset",
    "$inc",
    "$mul",
    "$rename",
    "$setOnInsert",
    "$push",
    "$pushAll",
    "$pull",
    "$pullAll",
    "$pop",
    "$addToSet",
    "$currentDate",
    "$bit",
    "$out",
    "$merge",
    "$where",
    "$function",
    "$accumulator",
];

/// Update operators only at the top level. Nested, they are aggregation
/// expressions (`{"$expr": {"$max": ...}}`).
const TOP_LEVEL_ONLY: &[&str] = &["$min", "$max"];

/// Return the first disallowed operator found anywhere in `filter`.
pub fn find_disallowed_operator(filter: &Map<String, Value>) -> Option<String> {
    if let Some(key) = filter.keys().find(|k| TOP_LEVEL_ONLY.contains(&k.as_str())) {
        return Some(key.clone());
    }
    scan_object(filter)
}

fn scan_object(object: &Map<String, Value>) -> Option<String> {
    for (key, value) in object {
        if DISALLOWED_OPERATORS.contains(&key.as_str()) {
            return Some(key.clone());
        }
        if let Some(found) = scan_value(value) {
            return Some(found);
        }
    }
    None
}

fn scan_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => scan_object(object),
        Value::Array(items) => items.iter().find_map(scan_value),
        _ => None,
    }
}
