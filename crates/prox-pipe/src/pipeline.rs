//! All stages in sequence: filter, label, proximity, reports.

use std::path::PathBuf;

use prox_core::{ProxError, RunProvenance};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{run_reports, ReportSet};
use crate::cancel::CancelToken;
use crate::dispatch::{run_proximity, write_atomic};
use crate::filters::{run_filter, FilterOutcome};
use crate::label::{run_labeling, LabelOutcome};
use crate::plan::{ensure_output_dir, PipelineConfig};
use crate::report::{provenance, RunReport};
use crate::serde::to_canonical_json_bytes;

/// Subdirectory of the output root holding the filtered tables.
pub const FILTERED_DIR: &str = "01filtered";
/// Subdirectory holding the labelled tables.
pub const SURVIVAL_DIR: &str = "02survival";
/// Subdirectory holding the enriched tables and `proximity_report.json`.
pub const PROXIMITY_DIR: &str = "03proximity";
/// Subdirectory holding the CSV reports.
pub const REPORTS_DIR: &str = "04reports";
/// File name of the pipeline report in the output root.
pub const PIPELINE_REPORT: &str = "pipeline_report.json";

/// Results of every stage of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Filter stage results.
    pub filter: Vec<FilterOutcome>,
    /// Label stage results.
    pub label: Vec<LabelOutcome>,
    /// Proximity stage report.
    pub proximity: RunReport,
    /// Report files; absent when the run was cancelled before the reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports: Option<ReportSet>,
    /// Provenance metadata.
    pub provenance: RunProvenance,
}

/// Runs every stage into the numbered subdirectories of the output root.
pub fn run_pipeline(config: &PipelineConfig, cancel: &CancelToken) -> Result<PipelineReport, ProxError> {
    config.validate()?;
    let root = config.output_dir();
    ensure_output_dir(&root)?;
    let stage_dir = |name: &str| -> PathBuf { root.join(name) };

    let filter = run_filter(
        &config.input_dir(),
        &stage_dir(FILTERED_DIR),
        &config.columns,
        &config.filters,
        config.concurrency,
    )?;
    let label = run_labeling(
        &stage_dir(FILTERED_DIR),
        &stage_dir(SURVIVAL_DIR),
        &config.columns,
        &config.labeling,
        config.concurrency,
    )?;
    let proximity = run_proximity(config, &stage_dir(SURVIVAL_DIR), &stage_dir(PROXIMITY_DIR), cancel)?;
    let reports = if cancel.is_cancelled() {
        warn!("run cancelled, reports not generated");
        None
    } else {
        Some(run_reports(
            &stage_dir(PROXIMITY_DIR),
            &stage_dir(REPORTS_DIR),
            &config.columns,
            config.concurrency,
        )?)
    };

    let report = PipelineReport {
        filter,
        label,
        proximity,
        reports,
        provenance: provenance(config)?,
    };
    write_atomic(&root.join(PIPELINE_REPORT), &to_canonical_json_bytes(&report)?)?;
    info!(output = %root.display(), "pipeline finished");
    Ok(report)
}
