//! Deserialization helpers for loosely typed billing payloads.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Accept a JSON object, `null`, or an empty array as a string-keyed map.
///
/// The billing service encodes an empty map as `[]`.
pub(crate) fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected an object, found {other}"
        ))),
    }
}
