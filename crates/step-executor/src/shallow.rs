use serde_json::Value;

/// Nesting depth kept verbatim when a session result is reported.
pub const SUMMARY_DEPTH: usize = 2;

/// Copies `value` down to `max_depth` levels; deeper containers become
/// `"[Object: n keys]"` / `"[Array: n items]"` markers.
pub fn shallow_json(value: &Value, max_depth: usize) -> Value {
    shallow_at(value, 0, max_depth)
}

fn shallow_at(value: &Value, depth: usize, max_depth: usize) -> Value {
    match value {
        Value::Object(map) if depth >= max_depth => {
            Value::String(format!("[Object: {} keys]", map.len()))
        }
        Value::Array(items) if depth >= max_depth => {
            Value::String(format!("[Array: {} items]", items.len()))
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), shallow_at(item, depth + 1, max_depth)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| shallow_at(item, depth + 1, max_depth))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// One-line rendering of a session result for logs and reports.
pub fn summarize_result(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => shallow_json(other, SUMMARY_DEPTH).to_string(),
    }
}
