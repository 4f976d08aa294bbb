use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use commands::{
    filter::{self, FilterArgs},
    label::{self, LabelArgs},
    pipeline::{self, PipelineArgs},
    proximity::{self, ProximityArgs},
    report::{self, ReportArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "prox", about = "Competitor proximity and business survival analysis")]
struct Cli {
    /// Log level (`error`, `warn`, `info`, `debug`, `trace`); overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter raw industry tables by region, permit year and status.
    Filter(FilterArgs),
    /// Add the survival label to filtered tables.
    Label(LabelArgs),
    /// Compute nearest competitor distances and adjacency counts.
    Proximity(ProximityArgs),
    /// Write industry, survival and inference reports.
    Report(ReportArgs),
    /// Run every stage from a configuration file.
    Pipeline(PipelineArgs),
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    match cli.command {
        Command::Filter(args) => filter::run(&args),
        Command::Label(args) => label::run(&args),
        Command::Proximity(args) => proximity::run(&args),
        Command::Report(args) => report::run(&args),
        Command::Pipeline(args) => pipeline::run(&args),
    }
}
