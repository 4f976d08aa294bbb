use std::fs;
use std::path::{Path, PathBuf};

use prox_core::{industry_name, ColumnSchema, ErrorInfo, ProxError, Table};
use prox_engine::ProximityEngine;
use rayon::prelude::*;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::plan::{ensure_input_dir, ensure_output_dir, PipelineConfig};
use crate::report::{RunReport, TableReport, TableStatus};
use crate::serde::to_canonical_json_bytes;
use crate::stages::enrich_table;

/// File name of the run report written next to the enriched tables.
pub const PROXIMITY_REPORT: &str = "proximity_report.json";

/// Lists the `.csv` files directly under `root`, sorted by file name.
pub fn discover_tables(root: &Path) -> Result<Vec<PathBuf>, ProxError> {
    let mut tables = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| ProxError::io("table_discovery", root, err))?;
        let is_csv = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if entry.file_type().is_file() && is_csv {
            tables.push(entry.into_path());
        }
    }
    Ok(tables)
}

/// Runs `job` once per table on a pool of `concurrency` threads and returns
/// the results in discovery order.
pub fn for_each_table<T, F>(tables: &[PathBuf], concurrency: usize, job: F) -> Result<Vec<T>, ProxError>
where
    T: Send,
    F: Fn(&Path) -> T + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .map_err(|err| ProxError::Config(ErrorInfo::new("config_thread_pool", err.to_string())))?;
    let mut ordered: Vec<(usize, T)> = pool.install(|| {
        tables
            .par_iter()
            .enumerate()
            .map(|(index, path)| (index, job(path.as_path())))
            .collect()
    });
    ordered.sort_by_key(|(index, _)| *index);
    Ok(ordered.into_iter().map(|(_, result)| result).collect())
}

/// File name component of a table path.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Enriches every table under `input` with the proximity columns, writing
/// the results and `proximity_report.json` under `output`.
///
/// Only configuration problems are returned as errors; table failures are
/// recorded in the report.
pub fn run_proximity(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    cancel: &CancelToken,
) -> Result<RunReport, ProxError> {
    let horizon = config.horizon_date()?;
    ensure_input_dir(input)?;
    ensure_output_dir(output)?;
    let engine = ProximityEngine::new(horizon);
    let tables = discover_tables(input)?;
    info!(tables = tables.len(), input = %input.display(), %horizon, "proximity run started");

    let reports = for_each_table(&tables, config.concurrency, |path| {
        process_table(path, output, &config.columns, &engine, cancel)
    })?;

    let report = RunReport::new(config, reports)?;
    write_atomic(&output.join(PROXIMITY_REPORT), &to_canonical_json_bytes(&report)?)?;
    let totals = &report.totals;
    info!(
        complete = totals.complete,
        partial = totals.partial,
        skipped = totals.skipped,
        failed = totals.failed,
        cancelled = totals.cancelled,
        "proximity run finished"
    );
    Ok(report)
}

/// Runs the proximity stage with the directories named in the configuration.
pub fn run_proximity_from_config(config: &PipelineConfig, cancel: &CancelToken) -> Result<RunReport, ProxError> {
    config.validate()?;
    run_proximity(config, &config.input_dir(), &config.output_dir(), cancel)
}

fn process_table(
    path: &Path,
    output: &Path,
    schema: &ColumnSchema,
    engine: &ProximityEngine,
    cancel: &CancelToken,
) -> TableReport {
    let file = file_label(path);
    let industry = industry_name(path);
    if cancel.is_cancelled() {
        return TableReport::new(file, industry, TableStatus::cancelled());
    }
    info!(%file, "table started");
    let mut table = match Table::read_csv(path) {
        Ok(table) => table,
        Err(err) => {
            error!(%file, error = %err, "table unreadable");
            return TableReport::new(file, industry, TableStatus::failed(err));
        }
    };
    if !table.truncated_rows.is_empty() {
        warn!(%file, rows = ?table.truncated_rows, "lines with extra fields truncated to the header width");
    }

    match enrich_table(&mut table, schema, engine, cancel) {
        Ok(Some(metrics)) => {
            if let Err(err) = table.write_csv(&output.join(&file)) {
                error!(%file, error = %err, "table not written");
                return TableReport::new(file, industry, TableStatus::failed(err));
            }
            let status = TableStatus::finished(&metrics);
            info!(
                %file,
                rows = metrics.rows,
                accepted = metrics.accepted,
                flagged = metrics.flagged_total(),
                radius = metrics.radius.unwrap_or(0.0),
                "table finished"
            );
            TableReport::new(file, industry, status).with_metrics(metrics)
        }
        Ok(None) => {
            warn!(%file, "cancelled between proximity and adjacency");
            TableReport::new(file, industry, TableStatus::cancelled())
        }
        Err(err @ ProxError::Schema(_)) => {
            warn!(%file, error = %err, "table skipped");
            TableReport::new(file, industry, TableStatus::skipped(err))
        }
        Err(err) => {
            error!(%file, error = %err, "table failed");
            TableReport::new(file, industry, TableStatus::failed(err))
        }
    }
}

/// Writes `bytes` to `path` through a temporary sibling renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ProxError> {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    let tmp = path.with_file_name(name);
    fs::write(&tmp, bytes).map_err(|err| ProxError::io("report_write", &tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| ProxError::io("report_rename", path, err))
}
