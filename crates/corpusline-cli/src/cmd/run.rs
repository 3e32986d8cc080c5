//! `corpusline run` - full pipeline from run.toml

use anyhow::Result;
use clap::Args;
use corpusline_core::ProgressContext;

use super::RunConfigArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: RunConfigArgs,

    /// Sample texts and print a report before cleaning
    #[arg(long)]
    pub sample: bool,

    /// Number of texts to sample (implies --sample)
    #[arg(long)]
    pub sample_size: Option<usize>,
}

pub fn run(args: RunArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let mut run_config = args.common.load(config)?;
    if let Some(n) = args.sample_size {
        run_config.debug.enabled = true;
        run_config.debug.sample_size = n;
    } else if args.sample && !run_config.debug.enabled {
        run_config.debug.enabled = true;
        run_config.debug.sample_size = config.debug.sample_size;
    }

    // validated inside `run`
    let Some(summary) = corpusline_shard::run(&run_config, progress)? else {
        eprintln!("Filtering and cleaning are both disabled; nothing was run.");
        return Ok(());
    };

    if let Some(report) = &summary.debug {
        eprintln!("{}", report.format_table());
    }
    eprintln!("{}", summary.stage.format_table());
    eprintln!(
        "Corpus: {} ({} records)",
        summary.corpus.display(),
        summary.merge.records
    );
    Ok(())
}
