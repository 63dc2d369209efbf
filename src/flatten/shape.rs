use serde_json::Value;

/// Unwrap an outer batching array.
///
/// When `value` is an array whose elements are all arrays, the sub-arrays
/// are concatenated (one level only). Anything else, including `[]`, is
/// returned unchanged.
pub fn normalize_shape(value: Value) -> Value {
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
            let records = items
                .into_iter()
                .flat_map(|item| match item {
                    Value::Array(inner) => inner,
                    _ => Vec::new(),
                })
                .collect();
            Value::Array(records)
        }
        other => other,
    }
}
