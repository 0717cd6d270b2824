//! Strict RFC 8259 parsing on top of `serde_json`.
//!
//! - `arbitrary_precision` keeps every number literal as written; it becomes an exact
//!   [`Number`] when the tree is lowered into [`JsonValue`].
//! - Nesting is checked against `max_depth` before serde_json recurses, so its own fixed
//!   limit is switched off.
//! - Duplicate object keys: the last occurrence wins.

use serde::Deserialize;
use serde_json::error::Category;
use thiserror::Error;

use crate::number::Number;
use crate::value::{JsonValue, Map};

/// Default limit on array/object nesting. Bounds recursion in the parser and in every
/// later stage that walks the tree.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    /// Byte offset into the input where the problem was detected.
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }

    /// Human-readable reason without the position.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty input")]
    EmptyInput,
    #[error("unexpected character {0:?}")]
    UnexpectedToken(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("trailing data after top-level value")]
    TrailingData,
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Parse with the default nesting limit.
pub fn parse(text: &str) -> Result<JsonValue, ParseError> {
    Parser::new(text).parse()
}

pub struct Parser<'a> {
    text: &'a str,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse exactly one value surrounded by optional whitespace.
    pub fn parse(self) -> Result<JsonValue, ParseError> {
        check_depth(self.text, self.max_depth)?;

        let mut de = serde_json::Deserializer::from_str(self.text);
        de.disable_recursion_limit();
        let value = serde_json::Value::deserialize(&mut de)
            .and_then(|value| de.end().map(|()| value))
            .map_err(|e| from_serde_error(self.text, &e))?;
        lower(value, self.text)
    }
}

/// Bracket depth scan. Strings are skipped so brackets inside them do not count.
fn check_depth(text: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > max_depth {
                    return Err(ParseError::new(i, ParseErrorKind::NestingTooDeep(max_depth)));
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn lower(value: serde_json::Value, text: &str) -> Result<JsonValue, ParseError> {
    use serde_json::Value;
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(b),
        Value::Number(n) => {
            let literal = n.as_str();
            let number = literal.parse::<Number>().map_err(|e| {
                ParseError::new(text.find(literal).unwrap_or(0), e.kind)
            })?;
            JsonValue::Number(number)
        }
        Value::String(s) => JsonValue::String(s),
        Value::Array(items) => JsonValue::Array(
            items.into_iter().map(|item| lower(item, text)).collect::<Result<_, _>>()?,
        ),
        Value::Object(entries) => JsonValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, lower(v, text)?)))
                .collect::<Result<Map, ParseError>>()?,
        ),
    })
}

const ESCAPE_ERRORS: [&str; 4] = [
    "invalid escape",
    "invalid unicode code point",
    "lone leading surrogate",
    "unexpected end of hex escape",
];

/// serde_json reports 1-based line/column; the column counts bytes from the line start.
fn from_serde_error(text: &str, err: &serde_json::Error) -> ParseError {
    let message = err.to_string();

    if err.classify() == Category::Eof {
        let kind = if text.trim_matches(is_json_ws).is_empty() {
            ParseErrorKind::EmptyInput
        } else if message.starts_with("EOF while parsing a string") {
            ParseErrorKind::UnterminatedString
        } else {
            ParseErrorKind::UnexpectedEnd
        };
        return ParseError::new(text.len(), kind);
    }

    let line_start: usize =
        text.split_inclusive('\n').take(err.line().saturating_sub(1)).map(str::len).sum();
    let position = (line_start + err.column().saturating_sub(1)).min(text.len());

    let kind = if message.starts_with("trailing characters") {
        ParseErrorKind::TrailingData
    } else if message.starts_with("invalid number") || message.starts_with("number out of range") {
        ParseErrorKind::InvalidNumber
    } else if ESCAPE_ERRORS.iter().any(|p| message.starts_with(p)) {
        ParseErrorKind::InvalidEscape
    } else {
        match char_at(text, position) {
            Some(c) => ParseErrorKind::UnexpectedToken(c),
            None => ParseErrorKind::UnexpectedEnd,
        }
    };
    ParseError::new(position, kind)
}

fn is_json_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn char_at(text: &str, mut pos: usize) -> Option<char> {
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    text[pos..].chars().next()
}
