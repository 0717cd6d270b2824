//! Facade over parse -> canonicalize -> hash and parse -> struct encode.
//!
//! Every text entry point goes through [`canonical_digest`] or [`drift_json::canonicalize`];
//! there is no second canonicalization path to drift out of sync.

use drift_common::{sha256_digest, Digest};
use drift_json::{canonicalize, CanonicalJson, JsonValue, Parser, DEFAULT_MAX_DEPTH};
use drift_struct::EncodedStruct;
use prost_types::Struct;
use tracing::{debug, warn};

use crate::error::CoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum array/object nesting accepted by the parser.
    pub max_depth: usize,
}

impl EngineConfig {
    pub const MAX_DEPTH_ENV: &'static str = "DRIFT_MAX_DEPTH";

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(Self::MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => warn!(
                    value = %raw,
                    default = config.max_depth,
                    "ignoring invalid {}", Self::MAX_DEPTH_ENV
                ),
            }
        }
        config
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Output of the combined call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHash {
    pub normalized_json: String,
    pub deterministic_hash: String,
}

/// Canonical text and its digest, computed from one tree.
pub fn canonical_digest(value: &JsonValue) -> (CanonicalJson, Digest) {
    let canonical = canonicalize(value);
    let digest = sha256_digest(canonical.as_bytes());
    (canonical, digest)
}

/// Stateless engine. Copy it freely across threads; every call owns its own tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn parse(&self, text: &str) -> CoreResult<JsonValue> {
        Ok(Parser::new(text).with_max_depth(self.config.max_depth).parse()?)
    }

    /// Parse raw bytes. Invalid UTF-8 is an encoding error, not a parse error.
    pub fn parse_slice(&self, bytes: &[u8]) -> CoreResult<JsonValue> {
        self.parse(std::str::from_utf8(bytes)?)
    }

    pub fn normalize_json(&self, text: &str) -> CoreResult<String> {
        let value = self.parse(text)?;
        let normalized = canonicalize(&value).into_string();
        debug!(input_len = text.len(), output_len = normalized.len(), "normalize_json");
        Ok(normalized)
    }

    /// 64-char lowercase hex SHA-256 of the canonical form.
    pub fn deterministic_hash(&self, text: &str) -> CoreResult<String> {
        let value = self.parse(text)?;
        let (_, digest) = canonical_digest(&value);
        debug!(input_len = text.len(), "deterministic_hash");
        Ok(digest.to_hex())
    }

    /// Parse once, then canonicalize and hash that single tree.
    pub fn normalize_and_hash(&self, text: &str) -> CoreResult<NormalizedHash> {
        let value = self.parse(text)?;
        let (canonical, digest) = canonical_digest(&value);
        debug!(input_len = text.len(), output_len = canonical.as_str().len(), "normalize_and_hash");
        Ok(NormalizedHash {
            normalized_json: canonical.into_string(),
            deterministic_hash: digest.to_hex(),
        })
    }

    pub fn object_to_protobuf_struct(&self, text: &str) -> CoreResult<Struct> {
        let value = self.parse(text)?;
        Ok(drift_struct::to_struct(&value)?)
    }

    /// Struct bytes and top-level field count from one parse.
    pub fn encode_struct(&self, text: &str) -> CoreResult<EncodedStruct> {
        let value = self.parse(text)?;
        let encoded = drift_struct::encode_struct(&value)?;
        debug!(
            input_len = text.len(),
            bytes = encoded.bytes.len(),
            fields = encoded.field_count,
            "encode_struct"
        );
        Ok(encoded)
    }

    pub fn object_to_protobuf_struct_bytes(&self, text: &str) -> CoreResult<Vec<u8>> {
        Ok(self.encode_struct(text)?.bytes)
    }

    pub fn object_to_protobuf_struct_field_count(&self, text: &str) -> CoreResult<usize> {
        Ok(self.encode_struct(text)?.field_count)
    }
}
