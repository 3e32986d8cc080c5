//! Run manifest: how a corpus was produced and what it contains

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::merge::MergeStats;
use crate::stats::StageSummary;

/// File name of the manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Stored next to the merged corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub source_tag: String,
    /// Input format name ("text" or "jsonl")
    pub format: String,
    /// Units counted before planning
    pub total_units: usize,
    /// Units actually written to shards
    pub planned_units: usize,
    pub shards: usize,
    pub workers: usize,
    pub stage: StageSummary,
    pub merge: MergeStats,
    /// Blake3 hash of the corpus file
    pub corpus_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RunManifest {
    /// Write manifest to dir/manifest.json
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Read manifest from dir/manifest.json
    pub fn read_from(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Hash a file's contents with blake3.
pub fn hash_file(path: &Path) -> std::io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(hasher.finalize())
}
