//! Request data decoding
//!
//! Query strings, form-urlencoded bodies and header names, shaped the way
//! the mirror endpoint reports them. Maps keep first-appearance key order
//! (`serde_json` is built with `preserve_order`).

use hyper::HeaderMap;
use serde_json::map::Entry;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Single-valued map (`args`): every value is a JSON string
pub type SingleMap = Map<String, Value>;

/// Multi-valued map (`form`, `headers`): every value is an array of strings
pub type MultiMap = Map<String, Value>;

/// Add one more value under `key`, keeping the key's first position
fn append(map: &mut MultiMap, key: String, value: String) {
    match map.entry(key) {
        Entry::Occupied(mut slot) => {
            if let Value::Array(values) = slot.get_mut() {
                values.push(Value::String(value));
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(Value::Array(vec![Value::String(value)]));
        }
    }
}

/// Decode a query string; the last value of a repeated key wins
pub fn parse_args(query: Option<&str>) -> SingleMap {
    let mut args = SingleMap::new();
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()).into_owned() {
            // Replacing keeps the original position
            args.insert(key, Value::String(value));
        }
    }
    args
}

/// Decode a form-urlencoded body, keeping every value of a repeated key
pub fn parse_form(body: &str) -> MultiMap {
    let mut form = MultiMap::new();
    for (key, value) in form_urlencoded::parse(body.as_bytes()).into_owned() {
        append(&mut form, key, value);
    }
    form
}

/// Upper-case the first character only (`content-type` -> `Content-type`)
pub fn capitalize_header_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Group header values by capitalized name, in arrival order
pub fn normalize_headers(headers: &HeaderMap) -> MultiMap {
    let mut normalized = MultiMap::new();
    for (name, value) in headers {
        append(
            &mut normalized,
            capitalize_header_name(name.as_str()),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    normalized
}
