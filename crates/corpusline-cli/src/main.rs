//! corpusline - shard, clean and merge text corpora
//!
//! Splits plain-text or JSONL corpora into balanced shards, cleans every
//! record on a worker pool and merges the survivors into one JSONL corpus.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use corpusline_core::SharedProgress;

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "corpusline")]
#[command(about = "Shard, clean and merge text corpora")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./corpusline.toml or ~/.config/corpusline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline from run.toml
    Run(cmd::run::RunArgs),
    /// Count and shard the input without cleaning
    Plan(cmd::plan::PlanArgs),
    /// Count units of work in the input
    Count(cmd::count::CountArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress: SharedProgress = Arc::new(corpusline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    corpusline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Plan(args) => cmd::plan::run(args, &config, &progress),
        Command::Count(args) => cmd::count::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            let resolved = corpusline_shard::resolve_workers(config.workers.default)
                .min(config.workers.max);
            table.add_row(vec![
                "Workers",
                &format!(
                    "{} ({}, max: {})",
                    resolved,
                    if config.workers.default.is_some() {
                        "configured"
                    } else {
                        "auto"
                    },
                    config.workers.max
                ),
            ]);
            table.add_row(vec![
                "Debug sample size",
                &config.debug.sample_size.to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
