//! Run orchestration: enumerate → count → plan → sample → clean → merge

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use corpusline_core::{
    InputFormat, MmapLineCounter, ProgressContext, cleanup_tmp_files, fmt_num, list_shards,
    list_works, parse_object,
};
use corpusline_text::{DebugReport, Debugger};
use serde_json::Value;

use crate::config::RunConfig;
use crate::count::count_units;
use crate::manifest::{RunManifest, hash_file};
use crate::merge::{CORPUS_FILE, MergeStats, merge};
use crate::planner::{PlanConfig, PlanSummary, plan_shards};
use crate::stage::{Mode, run_stage};
use crate::stats::StageSummary;
use crate::transform::StageModules;

/// Enumerated and counted input
#[derive(Debug, Clone)]
pub struct Counted {
    pub format: InputFormat,
    pub files: Vec<PathBuf>,
    pub total_units: usize,
}

/// Summary of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_units: usize,
    pub workers: usize,
    pub plan: PlanSummary,
    pub debug: Option<DebugReport>,
    pub stage: StageSummary,
    pub merge: MergeStats,
    pub corpus: PathBuf,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!(
            "Done: {} of {} units kept in {} ({} shards, {} workers) in {:.1}s",
            fmt_num(self.merge.records),
            fmt_num(self.total_units),
            self.corpus.display(),
            self.plan.shards.len(),
            self.workers,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Enumerate the input and count its units.
pub fn count(config: &RunConfig) -> Result<Counted> {
    let format = config.format()?;
    let files = list_works(&config.input.path, format)
        .with_context(|| format!("failed to list input {}", config.input.path.display()))?;
    log::info!(
        "Found {} {format} files in {}",
        files.len(),
        config.input.path.display()
    );
    let total_units = count_units(&files, format, &MmapLineCounter);
    log::info!("Counted {} units", fmt_num(total_units));
    Ok(Counted {
        format,
        files,
        total_units,
    })
}

/// Count, then split the input into fresh shards under `<output>/.tmp`.
pub fn plan(config: &RunConfig, progress: &ProgressContext) -> Result<(Counted, PlanSummary)> {
    let counted = count(config)?;
    let shard_dir = config.tmp_dir();
    clear_shards(&shard_dir)?;

    let pb = progress.counter_bar("planning", counted.files.len() as u64);
    let summary = plan_shards(
        &PlanConfig {
            files: &counted.files,
            format: counted.format,
            workers: config.workers(),
            total_units: counted.total_units,
            output_dir: &shard_dir,
            source_tag: &config.output.source_tag,
        },
        &pb,
    )?;
    Ok((counted, summary))
}

/// Run the whole pipeline. Returns `None` when neither filtering nor
/// cleaning is enabled, in which case nothing is read or written.
pub fn run(config: &RunConfig, progress: &ProgressContext) -> Result<Option<RunSummary>> {
    let start = Instant::now();
    config.validate()?;
    if !config.has_work() {
        log::info!("Filtering and cleaning are both disabled; nothing to do");
        return Ok(None);
    }

    let workers = config.workers();
    let (counted, plan) = plan(config, progress)?;
    let shards: Vec<PathBuf> = plan.shards.iter().map(|s| s.path.clone()).collect();
    let text_key = config.effective_text_key();

    let debug = if config.debug.enabled {
        let report = sample_shards(&shards, text_key, config.debug.sample_size);
        report.log();
        Some(report)
    } else {
        None
    };

    let cleaned_dir = config.cleaned_dir();
    clear_shards(&cleaned_dir)?;
    let modules = StageModules::from_config(config);
    let stage = run_stage(
        &shards,
        &cleaned_dir,
        Mode::from_workers(workers),
        &modules,
        text_key,
        progress,
    )?;

    let out_dir = config.out_dir();
    let pb = progress.counter_bar("merging", shards.len() as u64);
    let merged = merge(
        &cleaned_dir,
        &out_dir,
        true,
        &config.output.source_tag,
        &pb,
    )?;

    let corpus = out_dir.join(CORPUS_FILE);
    let corpus_hash =
        hash_file(&corpus).with_context(|| format!("failed to hash {}", corpus.display()))?;
    RunManifest {
        source_tag: config.output.source_tag.clone(),
        format: counted.format.to_string(),
        total_units: counted.total_units,
        planned_units: plan.units_written,
        shards: plan.shards.len(),
        workers,
        stage: stage.clone(),
        merge: merged.clone(),
        corpus_hash: corpus_hash.to_hex().to_string(),
        created_at: chrono::Utc::now(),
    }
    .write_to(&out_dir)?;

    let summary = RunSummary {
        total_units: counted.total_units,
        workers,
        plan,
        debug,
        stage,
        merge: merged,
        corpus,
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(Some(summary))
}

/// Feed shard texts, in shard order, to a debugger until it is full.
pub fn sample_shards(shards: &[PathBuf], text_key: &str, sample_size: usize) -> DebugReport {
    let mut debugger = Debugger::new(sample_size);
    'shards: for path in shards {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::debug!("Debugger skipping {}: {e}", path.display());
                continue;
            }
        };
        for line in BufReader::new(file).lines() {
            let Ok(line) = line else {
                continue 'shards;
            };
            let Ok(record) = parse_object(&line) else {
                continue;
            };
            if let Some(text) = record.get(text_key).and_then(Value::as_str) {
                debugger.sample(text);
            }
            if debugger.is_full() {
                break 'shards;
            }
        }
    }
    debugger.report()
}

/// Remove shard files and stale temporaries left by an earlier run.
fn clear_shards(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let stale = list_shards(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    if !stale.is_empty() {
        log::info!(
            "Removing {} shards from an earlier run in {}",
            stale.len(),
            dir.display()
        );
    }
    for path in stale {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }
    cleanup_tmp_files(dir).with_context(|| format!("failed to clean {}", dir.display()))?;
    Ok(())
}
