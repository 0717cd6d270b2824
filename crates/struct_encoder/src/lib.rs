//! drift_struct
//!
//! JsonValue -> `google.protobuf.Struct` wire bytes.
//! - Top level must be an object; `Struct` has no other shape.
//! - Numbers are projected to `double`. Integers past 2^53 lose precision here and only here.
//! - Map entries are written in byte-wise key order (`prost_types::Struct` keeps them in a
//!   `BTreeMap`), so equal objects always encode to equal bytes.
//! - Nesting is capped at [`MAX_STRUCT_DEPTH`] so every encoding we produce decodes again
//!   under prost's fixed recursion limit (100). An object level costs three units there
//!   (map entry, `Value`, `Struct`), a list level two.

use drift_json::{JsonValue, Map, Number};
use prost::Message;
use prost_types::{value::Kind, ListValue, NullValue, Struct, Value};
use thiserror::Error;

/// Deepest container nesting accepted by the encoder; the top-level object is level 1.
pub const MAX_STRUCT_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum StructError {
    #[error("top-level value must be an object, got {found}")]
    NotAnObject { found: &'static str },
    #[error("value nests deeper than {limit} levels, which Struct decoding cannot read back")]
    TooDeep { limit: usize },
    #[error("number {literal} is outside the finite double range")]
    NumberOutOfRange { literal: String },
    #[error("invalid struct encoding: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("struct contains a non-finite number")]
    NonFiniteNumber,
}

/// Encoded `Struct` plus the number of top-level fields it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStruct {
    pub bytes: Vec<u8>,
    pub field_count: usize,
}

/// Build the `Struct` message for a top-level object.
pub fn to_struct(value: &JsonValue) -> Result<Struct, StructError> {
    match value {
        JsonValue::Object(map) => object_to_struct(map, 1),
        other => Err(StructError::NotAnObject { found: other.type_name() }),
    }
}

/// Encode a top-level object. `field_count` counts direct entries only.
pub fn encode_struct(value: &JsonValue) -> Result<EncodedStruct, StructError> {
    let message = to_struct(value)?;
    Ok(EncodedStruct { field_count: message.fields.len(), bytes: message.encode_to_vec() })
}

/// Decode `Struct` wire bytes back into a value tree.
pub fn decode_struct(bytes: &[u8]) -> Result<JsonValue, StructError> {
    let message = Struct::decode(bytes)?;
    struct_to_json(&message)
}

fn object_to_struct(map: &Map, depth: usize) -> Result<Struct, StructError> {
    let fields = map
        .iter()
        .map(|(k, child)| Ok((k.clone(), to_proto_value(child, depth)?)))
        .collect::<Result<_, StructError>>()?;
    Ok(Struct { fields })
}

/// `depth` is the nesting level of the container holding `value`.
fn to_proto_value(value: &JsonValue, depth: usize) -> Result<Value, StructError> {
    if matches!(value, JsonValue::Array(_) | JsonValue::Object(_)) && depth >= MAX_STRUCT_DEPTH {
        return Err(StructError::TooDeep { limit: MAX_STRUCT_DEPTH });
    }
    let kind = match value {
        JsonValue::Null => Kind::NullValue(NullValue::NullValue as i32),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => Kind::NumberValue(project_number(n)?),
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items
                .iter()
                .map(|item| to_proto_value(item, depth + 1))
                .collect::<Result<_, _>>()?,
        }),
        JsonValue::Object(map) => Kind::StructValue(object_to_struct(map, depth + 1)?),
    };
    Ok(Value { kind: Some(kind) })
}

fn project_number(n: &Number) -> Result<f64, StructError> {
    let f = n.to_f64();
    if f.is_finite() {
        Ok(f)
    } else {
        Err(StructError::NumberOutOfRange { literal: n.to_string() })
    }
}

fn struct_to_json(message: &Struct) -> Result<JsonValue, StructError> {
    let map = message
        .fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), proto_value_to_json(v)?)))
        .collect::<Result<Map, StructError>>()?;
    Ok(JsonValue::Object(map))
}

fn proto_value_to_json(value: &Value) -> Result<JsonValue, StructError> {
    Ok(match &value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::NumberValue(f)) => {
            JsonValue::Number(Number::from_f64(*f).ok_or(StructError::NonFiniteNumber)?)
        }
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => JsonValue::Array(
            list.values.iter().map(proto_value_to_json).collect::<Result<_, _>>()?,
        ),
        Some(Kind::StructValue(s)) => struct_to_json(s)?,
    })
}
