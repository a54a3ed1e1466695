use crate::error::{Result, StoreError};
use serde::Serialize;
use serde_json::{Map, Value};

/// JSON shape name used in error messages.
pub(crate) fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode `value` and require it to be a JSON object.
pub(crate) fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(StoreError::Encode)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidState {
            found: shape_of(&other),
        }),
    }
}

pub(crate) fn is_object_like<T: Serialize + ?Sized>(value: &T) -> bool {
    matches!(serde_json::to_value(value), Ok(Value::Object(_)))
}
