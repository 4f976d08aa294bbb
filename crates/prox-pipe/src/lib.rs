#![deny(missing_docs)]
#![doc = "Stage orchestration over directories of industry tables."]

/// Stage 5 report assembly.
pub mod aggregate;
/// Cooperative cancellation.
pub mod cancel;
/// Table discovery and the per-table worker pool.
pub mod dispatch;
/// Stage 1 record filters.
pub mod filters;
/// Canonical hashing helpers.
pub mod hash;
/// Welch t-tests and logistic fits per industry.
pub mod inference;
/// Stage 2 survival labelling.
pub mod label;
/// Per-table counters.
pub mod metrics;
/// End-to-end pipeline.
pub mod pipeline;
/// Configuration loading and validation.
pub mod plan;
/// Run report assembly.
pub mod report;
/// Canonical JSON serde helpers.
pub mod serde;
/// Proximity enrichment of a single table.
pub mod stages;
/// Industry counts and survival summaries.
pub mod summary;

pub use aggregate::{load_frames, run_reports, IndustryFrame, Metric, ReportSet};
pub use cancel::CancelToken;
pub use dispatch::{discover_tables, run_proximity, run_proximity_from_config, PROXIMITY_REPORT};
pub use filters::{run_filter, FilterDisposition, FilterOutcome, FilterSpec};
pub use label::{run_labeling, LabelOutcome, LabelSpec};
pub use metrics::TableMetrics;
pub use pipeline::{run_pipeline, PipelineReport};
pub use plan::{load_config, PipelineConfig};
pub use report::{RunReport, RunTotals, TableReport, TableState, TableStatus};
pub use stages::enrich_table;
