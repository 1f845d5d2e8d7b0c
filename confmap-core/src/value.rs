//! Input values and helpers for interpreting them.

use crate::error::ValueError;
use serde_json::Value;

/// An ordered mapping of keys to values, as handed to a dispatcher.
///
/// Iteration follows insertion order (`serde_json` is built with
/// `preserve_order`).
pub type Input = serde_json::Map<String, Value>;

/// JSON type name of a value, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interpret a value as a list of keys.
///
/// Accepts a single key, a comma separated string (`"a,b,c"`) or an array of
/// scalars. Entries are trimmed and empty entries dropped; order is kept.
/// A bare boolean is not a key list, so `{ get: true }` is rejected.
pub fn key_list(value: &Value) -> Result<Vec<String>, ValueError> {
    match value {
        Value::String(s) => Ok(split_keys(s).collect()),
        Value::Array(items) => {
            let mut keys = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => keys.extend(split_keys(s)),
                    Value::Number(n) => keys.push(n.to_string()),
                    Value::Bool(b) => keys.push(b.to_string()),
                    other => {
                        return Err(ValueError::ExpectedKeyList {
                            found: type_name(other),
                        });
                    }
                }
            }
            Ok(keys)
        }
        Value::Number(n) => Ok(vec![n.to_string()]),
        other => Err(ValueError::ExpectedKeyList {
            found: type_name(other),
        }),
    }
}

/// Interpret a value as an object.
pub fn as_object(value: &Value) -> Result<&Input, ValueError> {
    value.as_object().ok_or(ValueError::ExpectedObject {
        found: type_name(value),
    })
}

/// Interpret a value as a string.
pub fn as_str(value: &Value) -> Result<&str, ValueError> {
    value.as_str().ok_or(ValueError::ExpectedString {
        found: type_name(value),
    })
}

fn split_keys(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
}
