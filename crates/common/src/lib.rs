//! drift_common
//!
//! SHA-256 digests over canonical bytes.
//! This exists to guarantee one hashing path for:
//! - standalone `deterministic_hash`
//! - the combined normalize + hash call
//! - export payload value/schema hashes
//!
//! IMPORTANT: Hash only canonical bytes. Never hash caller-formatted text.

use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Byte length of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum DigestError {
    #[error("invalid hex digest: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("digest must be {DIGEST_LEN} bytes, got {0}")]
    Length(usize),
}

/// Fixed 32-byte SHA-256 value. Renders as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        let raw = hex::decode(s)?;
        let bytes: [u8; DIGEST_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| DigestError::Length(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// SHA-256 of raw bytes. No key, no salt.
pub fn sha256_digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hasher.finalize().into())
}

/// Lowercase hex SHA-256 of raw bytes (always 64 chars).
pub fn sha256_hex(bytes: &[u8]) -> String {
    sha256_digest(bytes).to_hex()
}
