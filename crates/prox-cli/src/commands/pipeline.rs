use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use prox_pipe::{load_config, run_pipeline, CancelToken};

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// YAML configuration describing the run.
    #[arg(long)]
    pub config: PathBuf,
    /// Cancel tables not yet started after this many seconds.
    #[arg(long)]
    pub time_budget_secs: Option<u64>,
}

pub fn run(args: &PipelineArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config)?;
    let cancel = CancelToken::new();
    if let Some(secs) = args.time_budget_secs {
        cancel.cancel_after(Duration::from_secs(secs));
    }
    let report = run_pipeline(&config, &cancel)?;
    println!("{}", serde_json::to_string_pretty(&report.proximity.totals)?);
    Ok(())
}
