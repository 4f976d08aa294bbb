use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use prox_pipe::run_labeling;
use tracing::info;

use super::base_config;

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Directory of filtered tables.
    #[arg(long)]
    pub input: PathBuf,
    /// Directory receiving the labelled tables.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML configuration supplying column names and the survival rule.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Closed businesses survived when they operated longer than this many years.
    #[arg(long)]
    pub min_years: Option<f64>,
    /// Worker threads.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub fn run(args: &LabelArgs) -> Result<(), Box<dyn Error>> {
    let mut config = base_config(args.config.as_deref(), &args.input, &args.out)?;
    if let Some(min_years) = args.min_years {
        config.labeling.min_years = min_years;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    let outcomes = run_labeling(
        &args.input,
        &args.out,
        &config.columns,
        &config.labeling,
        config.concurrency.max(1),
    )?;
    let failed = outcomes.iter().filter(|outcome| outcome.error.is_some()).count();
    let survived: usize = outcomes.iter().map(|outcome| outcome.survived).sum();
    info!(tables = outcomes.len(), failed, survived, "labelling finished");
    Ok(())
}
