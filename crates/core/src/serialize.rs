//! Canonical bytes and hashes for any `Serialize` value.
//!
//! The value is lowered through `serde_json::Value` and then written by the same
//! canonicalizer as text input, so `{"b":2,"a":1}` parsed and a struct `{ b: 2, a: 1 }`
//! serialized hash identically.

use serde::Serialize;

use crate::engine::canonical_digest;
use crate::error::{CoreError, CoreResult};
use drift_json::{canonicalize, JsonValue};

fn to_tree<T: Serialize>(value: &T) -> CoreResult<JsonValue> {
    let lowered = serde_json::to_value(value)
        .map_err(|e| CoreError::Type(format!("failed to serialize value: {e}")))?;
    Ok(JsonValue::from(lowered))
}

/// Canonical JSON bytes: sorted keys, no whitespace, UTF-8.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    Ok(canonicalize(&to_tree(value)?).into_string().into_bytes())
}

/// Lowercase hex SHA-256 of [`canonical_json_bytes`].
pub fn sha256_canonical_json<T: Serialize>(value: &T) -> CoreResult<String> {
    let (_, digest) = canonical_digest(&to_tree(value)?);
    Ok(digest.to_hex())
}
