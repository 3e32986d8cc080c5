//! Stage runner: drive the single-shard procedure over every shard
//!
//! Single-thread mode walks shards in order. Parallel mode starts a fixed
//! set of workers on a rayon pool; each claims whole shards from a
//! [`ShardQueue`] until it is drained. Workers share nothing mutable
//! except the result collectors, and each shard is claimed exactly once.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use corpusline_core::{ProgressContext, ShardQueue, cleanup_tmp_files, shard_index};

use crate::stats::{ShardStats, StageSummary};
use crate::transform::StageModules;
use crate::worker::process_shard;

/// How shards are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Parallel { workers: usize },
}

impl Mode {
    /// Parallel with `workers` workers; a single worker degrades to `Single`
    pub fn from_workers(workers: usize) -> Self {
        if workers > 1 {
            Self::Parallel { workers }
        } else {
            Self::Single
        }
    }
}

/// Run the record pipeline over `shards`, writing survivors to `output_dir`.
///
/// Shard failures are logged and counted, never fatal. Only failing to
/// prepare `output_dir` or to build the worker pool aborts the stage.
pub fn run_stage(
    shards: &[PathBuf],
    output_dir: &Path,
    mode: Mode,
    modules: &StageModules,
    text_key: &str,
    progress: &ProgressContext,
) -> Result<StageSummary> {
    let start = Instant::now();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    cleanup_tmp_files(output_dir)
        .with_context(|| format!("failed to clean {}", output_dir.display()))?;

    let overall = progress.counter_bar("cleaning", shards.len() as u64);
    let queue = ShardQueue::new(shards.to_vec());
    let stats: Mutex<Vec<ShardStats>> = Mutex::new(Vec::with_capacity(shards.len()));
    let failed = AtomicUsize::new(0);

    let work = || {
        while let Some((pos, path)) = queue.claim() {
            let idx = shard_index(path).unwrap_or(pos);
            let label = path
                .file_name()
                .map_or_else(|| format!("shard {idx}"), |n| n.to_string_lossy().into_owned());
            let pb = progress.shard_bar(&label);
            match process_shard(path, idx, output_dir, modules, text_key, &pb) {
                Ok(s) => {
                    s.log();
                    stats.lock().unwrap_or_else(|e| e.into_inner()).push(s);
                }
                Err(e) => {
                    log::warn!("Bad shard {}: {e}", path.display());
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            pb.finish_and_clear();
            overall.inc(1);
        }
    };

    match mode {
        Mode::Single => {
            log::info!("Cleaning {} shards on a single thread", shards.len());
            work();
        }
        Mode::Parallel { workers } => {
            let workers = workers.max(1);
            log::info!("Cleaning {} shards with {workers} workers", shards.len());
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .context("failed to create thread pool")?;
            pool.scope(|s| {
                for _ in 0..workers {
                    s.spawn(|_| work());
                }
            });
        }
    }
    overall.finish_and_clear();

    let mut stats = stats.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.sort_by_key(|s| s.shard_idx);
    let mut summary =
        StageSummary::from_shards(&stats, queue.total(), failed.load(Ordering::Relaxed));
    summary.elapsed = start.elapsed();
    summary.log();
    Ok(summary)
}
