//! Error types for unit and record handling
//!
//! [`UnsupportedFormat`] is the only fatal error of a run. Everything else
//! is a [`RecordError`]: callers log it, count it and drop the unit.

use std::fmt;

/// Input extension that belongs to neither the text nor the JSONL family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat(pub String);

impl fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported input extension: {:?}", self.0)
    }
}

impl std::error::Error for UnsupportedFormat {}

/// Failure to turn one unit (file or line) into a record.
#[derive(Debug)]
pub enum RecordError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Line parsed as JSON but is not an object
    NotAnObject,
    /// Configured text field absent or not a string
    MissingText { key: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Json(e) => write!(f, "JSON: {e}"),
            Self::NotAnObject => write!(f, "record is not a JSON object"),
            Self::MissingText { key } => write!(f, "missing string field {key:?}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RecordError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Parse one JSONL line into an object.
pub fn parse_object(
    line: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, RecordError> {
    match serde_json::from_str(line)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(RecordError::NotAnObject),
    }
}
