use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Open-shape metadata value (§9). Represented as a concrete tagged
/// enum rather than threading `serde_json::Value` through typed APIs,
/// so call sites pattern-match on a known shape; round-trips 1:1 with
/// arbitrary JSON on the wire and in both backing stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<MetadataValue>),
    Object(BTreeMap<String, MetadataValue>),
}

pub type Metadata = BTreeMap<String, MetadataValue>;

impl From<JsonValue> for MetadataValue {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(a) => Self::Array(a.into_iter().map(Into::into).collect()),
            JsonValue::Object(o) => {
                Self::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<MetadataValue> for JsonValue {
    fn from(v: MetadataValue) -> Self {
        match v {
            MetadataValue::Null => JsonValue::Null,
            MetadataValue::Bool(b) => JsonValue::Bool(b),
            MetadataValue::Number(n) => JsonValue::Number(n),
            MetadataValue::String(s) => JsonValue::String(s),
            MetadataValue::Array(a) => JsonValue::Array(a.into_iter().map(Into::into).collect()),
            MetadataValue::Object(o) => {
                JsonValue::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl MetadataValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Self::Number(serde_json::Number::from(n))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_json_value_pass_through() {
        let original = json!({
            "nested": {"a": 1, "b": [true, null, "x"]},
            "top": 3.5,
        });

        let metadata: MetadataValue = original.clone().into();
        let back: JsonValue = metadata.into();
        assert_eq!(original, back);
    }

    #[test]
    fn object_keys_are_deterministically_ordered() {
        let v: MetadataValue = json!({"z": 1, "a": 2}).into();
        if let MetadataValue::Object(map) = v {
            let keys: Vec<_> = map.keys().collect();
            assert_eq!(keys, vec!["a", "z"]);
        } else {
            panic!("expected object");
        }
    }
}
