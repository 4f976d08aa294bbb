use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use prox_pipe::run_reports;
use tracing::info;

use super::base_config;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory of enriched tables.
    #[arg(long)]
    pub input: PathBuf,
    /// Directory receiving the report CSV files.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML configuration supplying column names.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ReportArgs) -> Result<(), Box<dyn Error>> {
    let config = base_config(args.config.as_deref(), &args.input, &args.out)?;
    let reports = run_reports(&args.input, &args.out, &config.columns, config.concurrency.max(1))?;
    for file in &reports.files {
        info!(file = %file.display(), "report written");
    }
    Ok(())
}
