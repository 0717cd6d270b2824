use drift_json::ParseError;
use drift_struct::StructError;
use thiserror::Error;

/// The three failure kinds callers can observe. Nothing is retried; no partial output.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or incomplete JSON text.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// Value shape does not fit the requested output (e.g. non-object `Struct`).
    #[error("type error: {0}")]
    Type(String),
    /// Broken internal invariant, e.g. invalid UTF-8 reaching a UTF-8-only stage.
    #[error("encoding error: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Type,
    Encoding,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Parse(_) => ErrorKind::Parse,
            CoreError::Type(_) => ErrorKind::Type,
            CoreError::Encoding(_) => ErrorKind::Encoding,
        }
    }
}

impl From<StructError> for CoreError {
    fn from(e: StructError) -> Self {
        match e {
            StructError::NotAnObject { .. }
            | StructError::NumberOutOfRange { .. }
            | StructError::TooDeep { .. } => {
                CoreError::Type(e.to_string())
            }
            StructError::Decode(_) | StructError::NonFiniteNumber => {
                CoreError::Encoding(e.to_string())
            }
        }
    }
}

impl From<std::str::Utf8Error> for CoreError {
    fn from(e: std::str::Utf8Error) -> Self {
        CoreError::Encoding(format!("input is not valid UTF-8: {e}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
