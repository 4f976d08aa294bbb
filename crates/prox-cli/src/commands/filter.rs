use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use prox_pipe::{run_filter, FilterDisposition};
use tracing::info;

use super::base_config;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Directory of raw industry tables.
    #[arg(long)]
    pub input: PathBuf,
    /// Directory receiving the filtered tables.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML configuration supplying column names and filter defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Keep rows whose address contains this text.
    #[arg(long)]
    pub address: Option<String>,
    /// Keep rows permitted in this year.
    #[arg(long)]
    pub permit_year: Option<i32>,
    /// Drop tables with this many rows or fewer.
    #[arg(long)]
    pub min_rows: Option<usize>,
    /// Worker threads.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub fn run(args: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let mut config = base_config(args.config.as_deref(), &args.input, &args.out)?;
    if args.address.is_some() {
        config.filters.address_contains = args.address.clone();
    }
    if args.permit_year.is_some() {
        config.filters.permit_year = args.permit_year;
    }
    if let Some(min_rows) = args.min_rows {
        config.filters.min_rows = min_rows;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    let outcomes = run_filter(
        &args.input,
        &args.out,
        &config.columns,
        &config.filters,
        config.concurrency.max(1),
    )?;
    let written = outcomes
        .iter()
        .filter(|outcome| outcome.disposition == FilterDisposition::Written)
        .count();
    info!(tables = outcomes.len(), written, "filter finished");
    Ok(())
}
