//! Export payload processing.
//!
//! One parse of the payload feeds:
//! - the normalized (canonical) payload
//! - the decoded payload, after top-level schema merges (base64 / embedded JSON)
//! - a structural schema of the decoded payload, annotated from the merges
//! - hashes of both, and the `Struct` encoding of the normalized payload

use std::collections::BTreeMap;

use base64::Engine as _;
use drift_json::{canonicalize, JsonValue, Map, Number, Parser};
use tracing::debug;

use crate::engine::{canonical_digest, Engine};
use crate::error::{CoreError, CoreResult};

/// Merge rule `encoding` value for base64-encoded strings.
const ENCODING_BASE64: i64 = 1;
/// Merge rule `decoded_type` value for strings holding JSON text.
const DECODED_TYPE_JSON: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub normalized_json: String,
    pub decoded_json: String,
    pub decoded_value_hash: String,
    pub decoded_schema_json: String,
    pub decoded_schema_hash: String,
    pub protobuf_struct_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayloadValue {
    pub normalized_value: JsonValue,
    pub decoded_value: JsonValue,
    pub decoded_value_hash: String,
    pub decoded_schema_value: JsonValue,
    pub decoded_schema_hash: String,
    pub protobuf_struct_bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MergeRule {
    encoding: Option<i64>,
    decoded_type: Option<i64>,
    match_importance: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
enum SchemaType {
    Number = 1,
    String = 2,
    Boolean = 3,
    Null = 4,
    Object = 6,
    OrderedList = 7,
}

impl SchemaType {
    fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => SchemaType::Null,
            JsonValue::Bool(_) => SchemaType::Boolean,
            JsonValue::Number(_) => SchemaType::Number,
            JsonValue::String(_) => SchemaType::String,
            JsonValue::Array(_) => SchemaType::OrderedList,
            JsonValue::Object(_) => SchemaType::Object,
        }
    }
}

impl Engine {
    pub fn process_export_payload(
        &self,
        payload_json: &str,
        schema_merges_json: Option<&str>,
    ) -> CoreResult<ExportPayload> {
        let payload = self.parse(payload_json)?;
        let result = self.process_export_payload_value(&payload, schema_merges_json)?;
        Ok(ExportPayload {
            normalized_json: canonicalize(&result.normalized_value).into_string(),
            decoded_json: canonicalize(&result.decoded_value).into_string(),
            decoded_value_hash: result.decoded_value_hash,
            decoded_schema_json: canonicalize(&result.decoded_schema_value).into_string(),
            decoded_schema_hash: result.decoded_schema_hash,
            protobuf_struct_bytes: result.protobuf_struct_bytes,
        })
    }

    pub fn process_export_payload_value(
        &self,
        payload: &JsonValue,
        schema_merges_json: Option<&str>,
    ) -> CoreResult<ExportPayloadValue> {
        let merges = match schema_merges_json {
            Some(text) => self.parse_merges(text)?,
            None => BTreeMap::new(),
        };

        let decoded = self.apply_merges(payload, &merges);
        let schema = schema_of(&decoded, Some(&merges));
        let (_, value_digest) = canonical_digest(&decoded);
        let (_, schema_digest) = canonical_digest(&schema);

        // Non-object payloads still export; they map to an empty Struct.
        let protobuf_struct_bytes = if payload.is_object() {
            drift_struct::encode_struct(payload)?.bytes
        } else {
            Vec::new()
        };

        debug!(
            merges = merges.len(),
            struct_bytes = protobuf_struct_bytes.len(),
            "process_export_payload"
        );

        Ok(ExportPayloadValue {
            normalized_value: payload.clone(),
            decoded_value: decoded,
            decoded_value_hash: value_digest.to_hex(),
            decoded_schema_value: schema,
            decoded_schema_hash: schema_digest.to_hex(),
            protobuf_struct_bytes,
        })
    }

    fn parse_merges(&self, text: &str) -> CoreResult<BTreeMap<String, MergeRule>> {
        let JsonValue::Object(entries) = self.parse(text)? else {
            return Err(CoreError::Type("schema merges must be an object".into()));
        };
        entries
            .into_iter()
            .map(|(key, rule)| {
                let rule = merge_rule(&key, &rule)?;
                Ok((key, rule))
            })
            .collect()
    }

    fn apply_merges(&self, normalized: &JsonValue, merges: &BTreeMap<String, MergeRule>) -> JsonValue {
        let JsonValue::Object(map) = normalized else {
            return normalized.clone();
        };
        if merges.is_empty() {
            return normalized.clone();
        }

        let mut decoded = map.clone();
        for (key, rule) in merges {
            let Some(slot) = decoded.get_mut(key) else {
                continue;
            };

            if rule.encoding == Some(ENCODING_BASE64) {
                if let JsonValue::String(s) = &mut *slot {
                    if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(s.as_bytes()) {
                        *s = String::from_utf8_lossy(&bytes).into_owned();
                    }
                }
            }

            if rule.decoded_type == Some(DECODED_TYPE_JSON) {
                if let JsonValue::String(s) = &*slot {
                    let parsed = Parser::new(s).with_max_depth(self.config().max_depth).parse();
                    if let Ok(value) = parsed {
                        *slot = value;
                    }
                }
            }
        }
        JsonValue::Object(decoded)
    }
}

fn merge_rule(key: &str, rule: &JsonValue) -> CoreResult<MergeRule> {
    let JsonValue::Object(fields) = rule else {
        return Err(CoreError::Type(format!(
            "schema merge for {key:?} must be an object, got {}",
            rule.type_name()
        )));
    };
    let int_field = |name: &str| -> CoreResult<Option<i64>> {
        match fields.get(name) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Number(n)) if n.as_i64().is_some() => Ok(n.as_i64()),
            Some(other) => Err(CoreError::Type(format!(
                "schema merge {key:?}.{name} must be an integer, got {}",
                other.type_name()
            ))),
        }
    };
    let match_importance = match fields.get("match_importance") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(n)) => Some(n.to_f64()),
        Some(other) => {
            return Err(CoreError::Type(format!(
                "schema merge {key:?}.match_importance must be a number, got {}",
                other.type_name()
            )))
        }
    };
    Ok(MergeRule {
        encoding: int_field("encoding")?,
        decoded_type: int_field("decoded_type")?,
        match_importance,
    })
}

/// Structural schema: `{"type": code, "properties": {...}}` plus `items` for arrays.
/// Merge annotations apply to the root object's direct children only.
fn schema_of(value: &JsonValue, merges: Option<&BTreeMap<String, MergeRule>>) -> JsonValue {
    let mut schema = Map::new();
    schema.insert("type".into(), JsonValue::from(SchemaType::of(value) as i64));

    let mut properties = Map::new();
    match value {
        JsonValue::Array(items) => {
            if let Some(first) = items.first() {
                schema.insert("items".into(), schema_of(first, None));
            }
        }
        JsonValue::Object(map) => {
            for (key, child) in map {
                let mut child_schema = schema_of(child, None);
                if let (Some(rule), JsonValue::Object(annotated)) =
                    (merges.and_then(|m| m.get(key)), &mut child_schema)
                {
                    annotate(annotated, rule);
                }
                properties.insert(key.clone(), child_schema);
            }
        }
        _ => {}
    }
    schema.insert("properties".into(), JsonValue::Object(properties));
    JsonValue::Object(schema)
}

fn annotate(schema: &mut Map, rule: &MergeRule) {
    if let Some(encoding) = rule.encoding {
        schema.insert("encoding".into(), JsonValue::from(encoding));
    }
    if let Some(decoded_type) = rule.decoded_type {
        schema.insert("decoded_type".into(), JsonValue::from(decoded_type));
    }
    if let Some(n) = rule.match_importance.and_then(Number::from_f64) {
        schema.insert("match_importance".into(), JsonValue::Number(n));
    }
}
