//! Listener filter matching

use serde_json::Value;

/// Check whether event data contains everything in `filter`
///
/// Objects match when every key of the filter is present in the data with a
/// matching value (extra keys in the data are ignored). Arrays must match
/// element-wise; all other values compare for equality, so `2` does not match `"2"`.
pub fn matches_filter(data: &Value, filter: &Value) -> bool {
    match (data, filter) {
        (Value::Object(data), Value::Object(filter)) => filter.iter().all(|(key, expected)| {
            data.get(key)
                .is_some_and(|actual| matches_filter(actual, expected))
        }),
        (Value::Array(data), Value::Array(filter)) => {
            data.len() == filter.len()
                && data.iter().zip(filter).all(|(a, e)| matches_filter(a, e))
        }
        _ => data == filter,
    }
}
