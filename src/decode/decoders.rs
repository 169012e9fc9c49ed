//! Decoder implementations

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Path to the records inside the body
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a decoder that treats the whole body as the records
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Configured record path
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }
}

impl RecordDecoder for JsonDecoder {
    fn parse(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }

    fn records(&self, body: &Value) -> Result<Vec<Value>> {
        match &self.record_path {
            // Wildcards need a real JSONPath engine
            Some(path) if path.contains('*') => extract_with_jsonpath(body, path),
            Some(path) => match value_at_path(body, path) {
                Some(Value::Array(arr)) => Ok(arr),
                Some(Value::Null) | None => Ok(vec![]),
                Some(record @ Value::Object(_)) => Ok(vec![record]),
                Some(scalar) => Err(Error::record_extraction(
                    path,
                    format!("expected an array or object, found {scalar}"),
                )),
            },
            None => match body {
                Value::Array(arr) => Ok(arr.clone()),
                Value::Null => Ok(vec![]),
                _ => Ok(vec![body.clone()]),
            },
        }
    }
}

// ============================================================================
// Path Helpers
// ============================================================================

/// Look up a value by dot path, with optional `$.` prefix and `[n]`
/// indexing (negative indices count from the end)
pub fn value_at_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        let Some(bracket_pos) = part.find('[') else {
            current = current.get(part)?;
            continue;
        };

        let name = &part[..bracket_pos];
        let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

        if !name.is_empty() {
            current = current.get(name)?;
        }

        let index: i64 = index_str.parse().ok()?;
        let Value::Array(arr) = current else {
            return None;
        };
        #[allow(clippy::cast_possible_wrap)]
        let idx = if index < 0 {
            usize::try_from(arr.len() as i64 + index).ok()?
        } else {
            usize::try_from(index).ok()?
        };
        current = arr.get(idx)?;
    }

    Some(current.clone())
}

/// Look up a scalar by dot path and render it as a string
pub fn string_at_path(value: &Value, path: &str) -> Option<String> {
    match value_at_path(value, path)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath: {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
