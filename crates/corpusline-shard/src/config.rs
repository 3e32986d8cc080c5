//! RunConfig: parse run.toml into an immutable, validated snapshot

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use corpusline_core::{InputFormat, UnsupportedFormat};
use corpusline_text::{CleanSettings, ExtractSettings, FilterSettings};
use serde::Deserialize;

/// Field holding the text of a wrapped plain-text unit and of every cleaned record
pub const TEXT_KEY: &str = "text";

/// Field injected into every unit at shard creation
pub const SOURCE_TAG_KEY: &str = "source_tag";

/// Top-level run.toml structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    /// Extractor settings
    #[serde(default)]
    pub extractor: ExtractSettings,
    /// Cleaner settings
    #[serde(default)]
    pub cleaner: CleanSettings,
    /// Filter settings
    #[serde(default)]
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Directory (or single file) of source documents
    pub path: PathBuf,
    /// Extension class of the input, e.g. "txt" or "jsonl"
    pub ext: String,
    /// Field holding the text in JSONL records
    #[serde(default = "default_text_key")]
    pub text_key: String,
}

fn default_text_key() -> String {
    TEXT_KEY.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of `.tmp/`, `.cleaned/` and `out/`
    pub path: PathBuf,
    /// Provenance label written into every record
    pub source_tag: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub filter: bool,
    pub clean: bool,
    /// Cross-shard merge post-processing (not implemented)
    pub merge: bool,
    /// Corpus truncation post-processing (not implemented)
    pub cut: bool,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            filter: true,
            clean: true,
            merge: false,
            cut: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub enabled: bool,
    /// Worker count hint; unset means available parallelism minus one
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub sample_size: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_size: 100,
        }
    }
}

/// Resolve a worker hint to a usable count (always ≥ 1).
///
/// Without a hint, one core is left for coordination and I/O.
pub fn resolve_workers(hint: Option<usize>) -> usize {
    match hint {
        Some(n) if n > 0 => n,
        _ => std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1),
    }
}

impl RunConfig {
    /// Parse run.toml from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse run config: {}", path.display()))?;
        Ok(config)
    }

    /// Input format from the configured extension.
    pub fn format(&self) -> Result<InputFormat, UnsupportedFormat> {
        InputFormat::from_extension(&self.input.ext)
    }

    /// Validate once at startup, before any file is touched.
    pub fn validate(&self) -> Result<()> {
        self.format()?;
        if self.output.source_tag.trim().is_empty() {
            anyhow::bail!("output.source_tag must not be empty");
        }
        if self.input.text_key.is_empty() {
            anyhow::bail!("input.text_key must not be empty");
        }
        if self.parallel.workers == Some(0) {
            anyhow::bail!("parallel.workers must be at least 1");
        }
        if self.debug.enabled && self.debug.sample_size == 0 {
            anyhow::bail!("debug.sample_size must be at least 1 when debug is enabled");
        }
        if self.input.path == self.output.path {
            anyhow::bail!(
                "input and output paths must differ: {}",
                self.input.path.display()
            );
        }
        if self.stages.merge {
            log::warn!("stages.merge is not implemented; ignoring");
        }
        if self.stages.cut {
            log::warn!("stages.cut is not implemented; ignoring");
        }
        Ok(())
    }

    /// Whether any transformation stage is enabled
    pub fn has_work(&self) -> bool {
        self.stages.filter || self.stages.clean
    }

    /// Field the record pipeline reads. Plain-text units are always wrapped
    /// under [`TEXT_KEY`], whatever `input.text_key` says.
    pub fn effective_text_key(&self) -> &str {
        match self.format() {
            Ok(InputFormat::Text) => TEXT_KEY,
            _ => &self.input.text_key,
        }
    }

    /// Workers for the stage runner; 1 when parallel mode is off
    pub fn workers(&self) -> usize {
        if self.parallel.enabled {
            resolve_workers(self.parallel.workers)
        } else {
            1
        }
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.output.path.join(".tmp")
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.output.path.join(".cleaned")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.output.path.join("out")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[input]
path = "raw"
ext = "jsonl"

[output]
path = "clean"
source_tag = "web"
"#;

    #[test]
    fn parse_minimal_run_config() {
        let config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();
        assert_eq!(config.input.text_key, "text");
        assert!(config.stages.filter && config.stages.clean);
        assert!(!config.parallel.enabled);
        assert_eq!(config.workers(), 1);
        assert_eq!(config.tmp_dir(), PathBuf::from("clean/.tmp"));
        assert_eq!(config.out_dir(), PathBuf::from("clean/out"));
    }

    #[test]
    fn parse_full_run_config() {
        let toml = r#"
[input]
path = "raw"
ext = "txt"
text_key = "content"

[output]
path = "clean"
source_tag = "books"

[stages]
filter = false

[parallel]
enabled = true
workers = 3

[debug]
enabled = true
sample_size = 7

[cleaner]
redact_emails = true

[filter]
min_chars = 20
"#;
        let config: RunConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.format().unwrap(), InputFormat::Text);
        assert_eq!(config.effective_text_key(), "text");
        assert!(!config.stages.filter);
        assert!(config.stages.clean);
        assert_eq!(config.workers(), 3);
        assert_eq!(config.debug.sample_size, 7);
        assert!(config.cleaner.redact_emails);
        assert_eq!(config.filter.min_chars, 20);
    }

    #[test]
    fn validate_rejects_unsupported_ext() {
        let mut config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.input.ext = "csv".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("csv"));
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.parallel.workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_tag() {
        let mut config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.output.source_tag = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_same_paths() {
        let mut config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.output.path = config.input.path.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn has_work_requires_a_stage() {
        let mut config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.stages.filter = false;
        assert!(config.has_work());
        config.stages.clean = false;
        assert!(!config.has_work());
    }

    #[test]
    fn resolve_workers_never_zero() {
        assert_eq!(resolve_workers(Some(4)), 4);
        assert!(resolve_workers(Some(0)) >= 1);
        assert!(resolve_workers(None) >= 1);
    }
}
