//! drift_json
//!
//! JSON value tree, strict parser and canonical serializer.
//! Canonical output is the input to every digest, so it must be byte-for-byte stable:
//! - keys sorted by UTF-8 bytes
//! - exact decimal numbers with one fixed rendering
//! - minimal string escaping, no whitespace

mod canonical;
mod number;
mod parse;
mod value;

pub use canonical::{canonicalize, CanonicalJson};
pub use number::Number;
pub use parse::{parse, ParseError, ParseErrorKind, Parser, DEFAULT_MAX_DEPTH};
pub use value::{JsonValue, Map};
