use std::collections::BTreeMap;

use crate::number::Number;

/// Object storage. `String`'s `Ord` is byte-wise over UTF-8, so iteration order is the
/// canonical key order and re-inserting a key replaces the earlier value.
pub type Map = BTreeMap<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonValue>),
    Object(Map),
}

impl JsonValue {
    /// Short name of the active case, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            JsonValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            JsonValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object().and_then(|m| m.get(key))
    }
}

impl From<Number> for JsonValue {
    fn from(n: Number) -> Self {
        JsonValue::Number(n)
    }
}

impl From<i64> for JsonValue {
    fn from(v: i64) -> Self {
        JsonValue::Number(v.into())
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue::Bool(v)
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        JsonValue::String(s)
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(s.to_string())
    }
}

impl From<Map> for JsonValue {
    fn from(m: Map) -> Self {
        JsonValue::Object(m)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(v: Vec<JsonValue>) -> Self {
        JsonValue::Array(v)
    }
}

impl From<&serde_json::Value> for JsonValue {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(from_serde_number(n)),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(JsonValue::from).collect()),
            Value::Object(map) => JsonValue::Object(
                map.iter().map(|(k, child)| (k.clone(), JsonValue::from(child))).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        JsonValue::from(&v)
    }
}

// `arbitrary_precision` keeps the literal verbatim; floats produced by serializers come
// out in shortest round-trip form. Both are valid literals for `Number`.
fn from_serde_number(n: &serde_json::Number) -> Number {
    n.as_str()
        .parse()
        .ok()
        .or_else(|| n.as_f64().and_then(Number::from_f64))
        .unwrap_or_else(Number::zero)
}
