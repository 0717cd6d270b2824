//! drift_core
//!
//! Deterministic JSON normalization, hashing and `google.protobuf.Struct` encoding.
//! These outputs are compared across processes and languages, so they must be byte-stable:
//! - `normalize_json`: canonical text (sorted keys, no whitespace, canonical numbers)
//! - `deterministic_hash`: lowercase hex SHA-256 of that text
//! - `object_to_protobuf_struct_*`: `Struct` wire bytes / top-level field count
//!
//! The free functions use a default [`Engine`]; build one with [`EngineConfig`] to change limits.

mod engine;
mod error;
mod payload;
mod serialize;

pub use engine::{canonical_digest, Engine, EngineConfig, NormalizedHash};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use payload::{ExportPayload, ExportPayloadValue};
pub use serialize::{canonical_json_bytes, sha256_canonical_json};

pub use drift_common::Digest;
pub use drift_json::{canonicalize, CanonicalJson, JsonValue, Map, Number, ParseError, ParseErrorKind};
pub use drift_struct::{decode_struct, EncodedStruct, MAX_STRUCT_DEPTH};
pub use prost_types::Struct;

pub fn parse(text: &str) -> CoreResult<JsonValue> {
    Engine::default().parse(text)
}

pub fn normalize_json(text: &str) -> CoreResult<String> {
    Engine::default().normalize_json(text)
}

pub fn deterministic_hash(text: &str) -> CoreResult<String> {
    Engine::default().deterministic_hash(text)
}

pub fn normalize_and_hash(text: &str) -> CoreResult<NormalizedHash> {
    Engine::default().normalize_and_hash(text)
}

pub fn object_to_protobuf_struct(text: &str) -> CoreResult<Struct> {
    Engine::default().object_to_protobuf_struct(text)
}

pub fn encode_struct(text: &str) -> CoreResult<EncodedStruct> {
    Engine::default().encode_struct(text)
}

pub fn object_to_protobuf_struct_bytes(text: &str) -> CoreResult<Vec<u8>> {
    Engine::default().object_to_protobuf_struct_bytes(text)
}

pub fn object_to_protobuf_struct_field_count(text: &str) -> CoreResult<usize> {
    Engine::default().object_to_protobuf_struct_field_count(text)
}

pub fn process_export_payload(
    payload_json: &str,
    schema_merges_json: Option<&str>,
) -> CoreResult<ExportPayload> {
    Engine::default().process_export_payload(payload_json, schema_merges_json)
}

pub fn process_export_payload_value(
    payload: &JsonValue,
    schema_merges_json: Option<&str>,
) -> CoreResult<ExportPayloadValue> {
    Engine::default().process_export_payload_value(payload, schema_merges_json)
}

/// Decode `Struct` bytes back into a value tree.
pub fn struct_bytes_to_json(bytes: &[u8]) -> CoreResult<JsonValue> {
    Ok(decode_struct(bytes)?)
}
