//! `corpusline count` - enumerate input and count units

use anyhow::Result;
use clap::Args;
use corpusline_core::fmt_num;

use super::RunConfigArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CountArgs {
    #[command(flatten)]
    pub common: RunConfigArgs,

    /// List every input file
    #[arg(long)]
    pub list: bool,
}

pub fn run(args: CountArgs, config: &Config) -> Result<()> {
    let run_config = args.common.load(config)?;
    run_config.validate()?;

    let counted = corpusline_shard::count(&run_config)?;
    if args.list {
        for path in &counted.files {
            println!("{}", path.display());
        }
    }
    println!(
        "{} units in {} {} files",
        fmt_num(counted.total_units),
        counted.files.len(),
        counted.format
    );
    Ok(())
}
