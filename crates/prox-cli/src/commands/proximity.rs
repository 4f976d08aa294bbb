use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use prox_pipe::{run_proximity_from_config, CancelToken};

use super::base_config;

#[derive(Args, Debug)]
pub struct ProximityArgs {
    /// Directory of labelled industry tables.
    #[arg(long)]
    pub input: PathBuf,
    /// Directory receiving the enriched tables and `proximity_report.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML configuration; the command line wins over its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Analysis horizon, `YYYY-MM-DD`.
    #[arg(long)]
    pub horizon: Option<String>,
    /// Worker threads, one table per task.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Cancel tables not yet started after this many seconds.
    #[arg(long)]
    pub time_budget_secs: Option<u64>,
}

pub fn run(args: &ProximityArgs) -> Result<(), Box<dyn Error>> {
    let mut config = base_config(args.config.as_deref(), &args.input, &args.out)?;
    if let Some(horizon) = &args.horizon {
        config.horizon = horizon.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let cancel = CancelToken::new();
    if let Some(secs) = args.time_budget_secs {
        cancel.cancel_after(Duration::from_secs(secs));
    }
    let report = run_proximity_from_config(&config, &cancel)?;
    println!("{}", serde_json::to_string_pretty(&report.totals)?);
    Ok(())
}
