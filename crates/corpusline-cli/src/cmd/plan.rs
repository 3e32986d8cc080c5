//! `corpusline plan` - count and shard without cleaning

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use corpusline_core::{ProgressContext, fmt_num};

use super::RunConfigArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub common: RunConfigArgs,
}

pub fn run(args: PlanArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let run_config = args.common.load(config)?;
    run_config.validate()?;

    let (counted, summary) = corpusline_shard::plan(&run_config, progress)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Shard").fg(Color::Cyan),
            Cell::new("Units").fg(Color::Cyan),
            Cell::new("Path").fg(Color::Cyan),
        ]);
    for shard in &summary.shards {
        table.add_row(vec![
            Cell::new(shard.idx),
            Cell::new(fmt_num(shard.units)),
            Cell::new(shard.path.display()),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "{} units counted, {} written to {} shards of up to {} ({} workers)",
        fmt_num(counted.total_units),
        fmt_num(summary.units_written),
        summary.shards.len(),
        fmt_num(summary.target_size),
        run_config.workers()
    );
    if summary.skipped_units > 0 || summary.failed_files > 0 {
        eprintln!(
            "{} unreadable files skipped, {} files abandoned mid-read",
            summary.skipped_units, summary.failed_files
        );
    }
    Ok(())
}
