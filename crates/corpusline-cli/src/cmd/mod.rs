pub mod count;
pub mod plan;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use corpusline_shard::{RunConfig, resolve_workers};

use crate::config::Config;

/// Arguments shared by every subcommand that reads a run.toml
#[derive(Args, Debug)]
pub struct RunConfigArgs {
    /// Path to run.toml
    pub run_config: PathBuf,

    /// Number of parallel workers (enables parallel mode)
    #[arg(short, long, conflicts_with = "single_thread")]
    pub workers: Option<usize>,

    /// Force single-thread mode
    #[arg(long)]
    pub single_thread: bool,
}

impl RunConfigArgs {
    /// Parse run.toml and apply global defaults and CLI overrides.
    pub fn load(&self, config: &Config) -> Result<RunConfig> {
        let mut run_config = RunConfig::from_file(&self.run_config)
            .with_context(|| format!("failed to load {}", self.run_config.display()))?;
        apply_overrides(&mut run_config, self.workers, self.single_thread, config);
        Ok(run_config)
    }
}

/// CLI flags win over run.toml, run.toml over the global defaults. An
/// unset count is resolved here so `workers.max` caps it too.
fn apply_overrides(
    run_config: &mut RunConfig,
    workers: Option<usize>,
    single_thread: bool,
    config: &Config,
) {
    if single_thread {
        run_config.parallel.enabled = false;
    } else if let Some(n) = workers {
        run_config.parallel.enabled = true;
        run_config.parallel.workers = Some(n);
    }
    if run_config.parallel.workers.is_none() {
        run_config.parallel.workers = config.workers.default;
    }
    if run_config.parallel.enabled && run_config.parallel.workers.is_none() {
        run_config.parallel.workers = Some(resolve_workers(None));
    }
    if let Some(n) = run_config.parallel.workers {
        run_config.parallel.workers = Some(n.min(config.workers.max));
    }
}
