//! Merger: concatenate cleaned shards into a single corpus file
//!
//! Shards are streamed line by line in shard-number order. A read failure
//! stops that shard (lines already merged stay in the corpus); a malformed
//! line is skipped alone.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use corpusline_core::{JsonlSink, fmt_num, list_shards, parse_object};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{SOURCE_TAG_KEY, TEXT_KEY};
use crate::planner::{Record, tag};

/// Name of the merged corpus inside the output directory
pub const CORPUS_FILE: &str = "corpus.jsonl";

/// Counters for one merge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeStats {
    pub shards: usize,
    pub failed_shards: usize,
    /// Records written to the corpus
    pub records: usize,
    /// Lines skipped as malformed (or without text when projecting)
    pub bad_records: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl MergeStats {
    pub fn log(&self) {
        log::info!(
            "Merged {} records from {} shards ({} failed shards, {} bad records) in {:.1}s",
            fmt_num(self.records),
            self.shards,
            self.failed_shards,
            fmt_num(self.bad_records),
            self.elapsed.as_secs_f64()
        );
    }
}

/// Keep only `text` and `source_tag`; `None` when the record has no text.
pub fn project(record: &Record, source_tag: &str) -> Option<Record> {
    let text = record.get(TEXT_KEY).and_then(Value::as_str)?;
    let mut out = Map::with_capacity(2);
    out.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
    out.insert(
        SOURCE_TAG_KEY.to_string(),
        Value::String(source_tag.to_string()),
    );
    Some(out)
}

/// Merge every `N.jsonl` of `input_dir` into `output_dir/corpus.jsonl`.
///
/// Each record is re-tagged with `source_tag`. With `keep_text_only`, it is
/// projected down to `{text, source_tag}`. The corpus file appears only
/// once the merge has finished.
pub fn merge(
    input_dir: &Path,
    output_dir: &Path,
    keep_text_only: bool,
    source_tag: &str,
    pb: &ProgressBar,
) -> Result<MergeStats> {
    let start = Instant::now();
    let shards = list_shards(input_dir)
        .with_context(|| format!("failed to list shards in {}", input_dir.display()))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut sink = JsonlSink::new(output_dir, CORPUS_FILE)
        .with_context(|| format!("failed to create {CORPUS_FILE}"))?;
    let mut stats = MergeStats {
        shards: shards.len(),
        ..Default::default()
    };

    for path in &shards {
        match copy_shard(path, &mut sink, keep_text_only, source_tag, &mut stats) {
            Ok(true) => {}
            Ok(false) => stats.failed_shards += 1,
            Err(e) => {
                sink.abandon();
                return Err(e).context("failed to write corpus");
            }
        }
        pb.inc(1);
    }

    sink.finalize().context("failed to finalize corpus")?;
    pb.finish_and_clear();
    stats.elapsed = start.elapsed();
    stats.log();
    Ok(stats)
}

/// Stream one shard into the corpus.
///
/// Read failures are logged and end the shard early (`Ok(false)`); only a
/// failed write is returned as an error.
fn copy_shard(
    path: &Path,
    sink: &mut JsonlSink,
    keep_text_only: bool,
    source_tag: &str,
    stats: &mut MergeStats,
) -> io::Result<bool> {
    let reader = match File::open(path) {
        Ok(file) => BufReader::new(file),
        Err(e) => {
            log::warn!("Skipping shard {}: {e}", path.display());
            return Ok(false);
        }
    };
    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("{}:{}: stopping shard: {e}", path.display(), line_no + 1);
                return Ok(false);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let mut record = match parse_object(&line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("{}:{}: skipping record: {e}", path.display(), line_no + 1);
                stats.bad_records += 1;
                continue;
            }
        };
        let record = if keep_text_only {
            match project(&record, source_tag) {
                Some(r) => r,
                None => {
                    stats.bad_records += 1;
                    continue;
                }
            }
        } else {
            tag(&mut record, source_tag);
            record
        };
        sink.write(&record)?;
        stats.records += 1;
    }
    Ok(true)
}
