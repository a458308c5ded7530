use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{deserialize_error, HookResult};

/// Copies `data` and, when it is a JSON object and `field` is set, stores `identity` under
/// `field`. Non-object values are returned unchanged.
pub fn with_identity_field(data: &Value, field: Option<&str>, identity: Option<&str>) -> Value {
    match (data, field) {
        (Value::Object(map), Some(field)) => {
            let mut map = map.clone();
            let identity = identity
                .map(|identity| Value::String(identity.to_string()))
                .unwrap_or(Value::Null);
            map.insert(field.to_string(), identity);
            Value::Object(map)
        }
        _ => data.clone(),
    }
}

pub fn from_data<T: DeserializeOwned>(data: Value) -> HookResult<T> {
    serde_json::from_value(data)
        .map_err(|err| deserialize_error(format!("Failed to deserialize snapshot data: {err}")))
}

/// Deserializes every entry of `data`, stopping at the first failure.
pub fn from_data_list<T: DeserializeOwned>(data: Vec<Value>) -> HookResult<Vec<T>> {
    data.into_iter().map(from_data).collect()
}
