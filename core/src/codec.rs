//! JSON document validation and scalar coercion.
//!
//! Stored values are always complete top-level JSON objects or arrays. Plain
//! strings and integers travel as one-element string arrays.

use serde_json::Value;

use crate::error::{PrefsError, Result};

/// Returns true when `value` is an object or an array.
#[must_use]
pub fn is_document(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Parses `text` and checks that its root is an object or an array.
///
/// # Errors
///
/// Returns [`PrefsError::ValueNotJson`] if the text does not parse or its root
/// is a bare scalar.
pub fn parse_document(text: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if is_document(&value) => Ok(value),
        _ => Err(PrefsError::ValueNotJson),
    }
}

/// Validates `text` as a top-level document without keeping the parse.
///
/// # Errors
///
/// Returns [`PrefsError::ValueNotJson`] under the same conditions as
/// [`parse_document`].
pub fn validate_document(text: &str) -> Result<()> {
    parse_document(text).map(drop)
}

/// Wraps a plain string as `["value"]`.
#[must_use]
pub fn wrap_scalar(value: &str) -> Value {
    Value::Array(vec![Value::String(value.to_owned())])
}

/// Wraps an integer as its base-10 string form, `["42"]`.
#[must_use]
pub fn wrap_int(value: i64) -> Value {
    wrap_scalar(&value.to_string())
}

/// Extracts the string at element 0 of a one-element array.
///
/// # Errors
///
/// Returns [`PrefsError::ValueNotJson`] if `value` is not an array, is empty,
/// or its first element is not a string.
pub fn unwrap_scalar(value: &Value) -> Result<&str> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_str)
        .ok_or(PrefsError::ValueNotJson)
}

/// Extracts an integer stored by [`wrap_int`].
///
/// Surrounding whitespace is tolerated; anything else that does not parse as
/// a base-10 `i64` is rejected.
///
/// # Errors
///
/// Returns [`PrefsError::ValueNotJson`] if the scalar is missing or is not
/// numeric.
pub fn unwrap_int(value: &Value) -> Result<i64> {
    unwrap_scalar(value)?
        .trim()
        .parse()
        .map_err(|_| PrefsError::ValueNotJson)
}

/// Renders a raw property value for a `{key: value}` pair.
///
/// Raw text that is already a document is embedded as parsed JSON; anything
/// else becomes a JSON string.
#[must_use]
pub fn raw_to_value(raw: &str) -> Value {
    parse_document(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Builds the single-entry object `{key: value}`.
#[must_use]
pub fn pair(key: &str, value: Value) -> Value {
    let mut object = serde_json::Map::with_capacity(1);
    object.insert(key.to_owned(), value);
    Value::Object(object)
}
