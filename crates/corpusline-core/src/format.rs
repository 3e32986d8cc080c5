//! Input format classes, selected once per run from the configured extension

use std::fmt;
use std::path::Path;

use crate::error::UnsupportedFormat;

/// Extensions read as one document per file
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

/// Extensions read as one JSON record per line
pub const JSONL_EXTENSIONS: &[&str] = &["jsonl", "ndjson", "json"];

/// How source files are split into units of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// Each file is one unit (raw text blob)
    Text,
    /// Each line is one unit (JSON object)
    Jsonl,
}

impl InputFormat {
    /// Resolve an extension such as `"txt"`, `".jsonl"` or `"NDJSON"`.
    pub fn from_extension(ext: &str) -> Result<Self, UnsupportedFormat> {
        let normalized = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if TEXT_EXTENSIONS.contains(&normalized.as_str()) {
            Ok(Self::Text)
        } else if JSONL_EXTENSIONS.contains(&normalized.as_str()) {
            Ok(Self::Jsonl)
        } else {
            Err(UnsupportedFormat(ext.to_string()))
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Text => TEXT_EXTENSIONS,
            Self::Jsonl => JSONL_EXTENSIONS,
        }
    }

    /// Whether `path` has an extension belonging to this format
    pub fn matches(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions().contains(&e.to_ascii_lowercase().as_str()))
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Jsonl => write!(f, "jsonl"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extensions() {
        assert_eq!(InputFormat::from_extension("txt").unwrap(), InputFormat::Text);
        assert_eq!(InputFormat::from_extension(".md").unwrap(), InputFormat::Text);
    }

    #[test]
    fn jsonl_extensions_case_insensitive() {
        assert_eq!(
            InputFormat::from_extension("JSONL").unwrap(),
            InputFormat::Jsonl
        );
        assert_eq!(
            InputFormat::from_extension(".ndjson").unwrap(),
            InputFormat::Jsonl
        );
    }

    #[test]
    fn unsupported_extension() {
        let err = InputFormat::from_extension("parquet").unwrap_err();
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn matches_path() {
        assert!(InputFormat::Jsonl.matches(Path::new("/data/a.JSONL")));
        assert!(!InputFormat::Jsonl.matches(Path::new("/data/a.txt")));
        assert!(!InputFormat::Text.matches(Path::new("/data/noext")));
    }
}
