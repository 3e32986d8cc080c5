//! Shard planning: split the unit stream into balanced, tagged JSONL shards
//!
//! Units are streamed file by file (line by line for JSONL) into a batch.
//! A batch is flushed to the next numbered shard as soon as it reaches the
//! target size, and once more when the stream is exhausted. Shards are
//! contiguous from `0.jsonl` and together reproduce the input order.
//!
//! Per-unit failures are best effort: an unreadable text file is dropped,
//! and a JSONL file that fails mid-read is abandoned from that line on
//! while the lines already read stay in the stream.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use corpusline_core::{InputFormat, JsonlSink, RecordError, parse_object, shard_file_name};
use indicatif::ProgressBar;
use serde_json::{Map, Value};

use crate::config::{SOURCE_TAG_KEY, TEXT_KEY};

/// One JSON object, the unit written to shards
pub type Record = Map<String, Value>;

/// Units per shard for `total_units` split across `workers`.
///
/// `(total + workers) / workers`: never the literal ceiling, but never
/// smaller, so the plan yields at most `workers` shards. A worker count of
/// zero is clamped to one.
pub fn target_size(total_units: usize, workers: usize) -> usize {
    let workers = workers.max(1);
    (total_units + workers) / workers
}

/// Inputs for one planning run
#[derive(Debug)]
pub struct PlanConfig<'a> {
    pub files: &'a [PathBuf],
    pub format: InputFormat,
    pub workers: usize,
    pub total_units: usize,
    pub output_dir: &'a Path,
    pub source_tag: &'a str,
}

/// A sealed shard file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardInfo {
    pub idx: usize,
    pub path: PathBuf,
    pub units: usize,
}

/// Outcome of a planning run
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub target_size: usize,
    pub shards: Vec<ShardInfo>,
    /// Units written across all shards
    pub units_written: usize,
    /// Text files that could not be read
    pub skipped_units: usize,
    /// JSONL files abandoned because of a read or parse failure
    pub failed_files: usize,
    pub elapsed: Duration,
}

impl PlanSummary {
    pub fn log(&self) {
        log::info!(
            "Planned {} shards of up to {} units ({} units, {} skipped units, {} failed files) in {:.1}s",
            self.shards.len(),
            self.target_size,
            self.units_written,
            self.skipped_units,
            self.failed_files,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Writes batches as numbered shard files, tagging every unit.
#[derive(Debug)]
pub struct ShardWriter<'a> {
    output_dir: &'a Path,
    source_tag: &'a str,
    shards: Vec<ShardInfo>,
}

impl<'a> ShardWriter<'a> {
    pub fn new(output_dir: &'a Path, source_tag: &'a str) -> Self {
        Self {
            output_dir,
            source_tag,
            shards: Vec::new(),
        }
    }

    /// Seal `batch` as the next shard. Draining an empty batch writes nothing.
    pub fn flush(&mut self, batch: &mut Vec<Record>) -> std::io::Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let idx = self.shards.len();
        let file_name = shard_file_name(idx);
        let mut sink = JsonlSink::new(self.output_dir, &file_name)?;
        for mut record in batch.drain(..) {
            tag(&mut record, self.source_tag);
            if let Err(e) = sink.write(&record) {
                sink.abandon();
                return Err(e);
            }
        }
        let units = sink.finalize()?;
        log::debug!("Sealed shard {file_name} with {units} units");
        self.shards.push(ShardInfo {
            idx,
            path: self.output_dir.join(file_name),
            units,
        });
        Ok(())
    }

    pub fn into_shards(self) -> Vec<ShardInfo> {
        self.shards
    }
}

/// Set the provenance tag. Re-tagging with the same value is a no-op.
pub fn tag(record: &mut Record, source_tag: &str) {
    record.insert(
        SOURCE_TAG_KEY.to_string(),
        Value::String(source_tag.to_string()),
    );
}

/// Wrap raw text as a record
pub fn wrap_text(text: String) -> Record {
    let mut record = Map::new();
    record.insert(TEXT_KEY.to_string(), Value::String(text));
    record
}

/// Read one plain-text file as a unit
pub fn read_text_unit(path: &Path) -> Result<Record, RecordError> {
    Ok(wrap_text(std::fs::read_to_string(path)?))
}

/// Accumulates units and flushes full batches
struct Batcher<'a> {
    target: usize,
    batch: Vec<Record>,
    writer: ShardWriter<'a>,
    written: usize,
}

impl Batcher<'_> {
    fn push(&mut self, record: Record) -> std::io::Result<()> {
        self.batch.push(record);
        if self.batch.len() >= self.target {
            self.written += self.batch.len();
            self.writer.flush(&mut self.batch)?;
        }
        Ok(())
    }

    fn finish(mut self) -> std::io::Result<(Vec<ShardInfo>, usize)> {
        self.written += self.batch.len();
        self.writer.flush(&mut self.batch)?;
        Ok((self.writer.into_shards(), self.written))
    }
}

/// Stream every unit of `cfg.files` into shards under `cfg.output_dir`.
///
/// Fails only when the output directory or a shard file cannot be written.
pub fn plan_shards(cfg: &PlanConfig<'_>, pb: &ProgressBar) -> Result<PlanSummary> {
    let start = Instant::now();
    std::fs::create_dir_all(cfg.output_dir).with_context(|| {
        format!(
            "failed to create shard directory: {}",
            cfg.output_dir.display()
        )
    })?;

    let target = target_size(cfg.total_units, cfg.workers);
    log::info!(
        "Sharding {} units across {} workers ({} units per shard)",
        cfg.total_units,
        cfg.workers.max(1),
        target
    );

    let mut batcher = Batcher {
        target,
        batch: Vec::with_capacity(target.min(64 * 1024)),
        writer: ShardWriter::new(cfg.output_dir, cfg.source_tag),
        written: 0,
    };
    let mut skipped_units = 0usize;
    let mut failed_files = 0usize;

    for path in cfg.files {
        match cfg.format {
            InputFormat::Text => match read_text_unit(path) {
                Ok(record) => batcher.push(record).context("failed to write shard")?,
                Err(e) => {
                    log::warn!("Skipping unreadable file {}: {e}", path.display());
                    skipped_units += 1;
                }
            },
            InputFormat::Jsonl => {
                if let Err(e) = stream_jsonl(path, &mut batcher).context("failed to write shard")? {
                    log::warn!("Bad file {}: {e}", path.display());
                    failed_files += 1;
                }
            }
        }
        pb.inc(1);
    }

    let (shards, units_written) = batcher.finish().context("failed to write final shard")?;
    pb.finish_and_clear();

    let summary = PlanSummary {
        target_size: target,
        shards,
        units_written,
        skipped_units,
        failed_files,
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}

/// Push every line of one JSONL file.
///
/// The outer error is a shard write failure (fatal); the inner one is the
/// first bad line of this file, after which the rest of the file is skipped.
fn stream_jsonl(
    path: &Path,
    batcher: &mut Batcher<'_>,
) -> std::io::Result<Result<(), RecordError>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Ok(Err(RecordError::Io(e))),
    };
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Ok(Err(RecordError::Io(e))),
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_object(&line) {
            Ok(record) => batcher.push(record)?,
            Err(e) => return Ok(Err(e)),
        }
    }
    Ok(Ok(()))
}
