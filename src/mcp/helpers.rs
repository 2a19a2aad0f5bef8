use serde_json::{Map, Value};

/// Extract a string array from JSON args; `None` when absent or null
pub(crate) fn extract_string_array(
    args: &Map<String, Value>,
    field: &str,
) -> Result<Option<Vec<String>>, String> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|v| v.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()
            .map(Some)
            .ok_or_else(|| format!("{} must be an array of strings", field)),
        Some(_) => Err(format!("{} must be an array of strings", field)),
    }
}

/// Extract an optional string argument
pub(crate) fn extract_optional_str<'a>(
    args: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, String> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("{} must be a string", field)),
    }
}
