//! Stage 5: per-industry reports over a directory of enriched tables.

use std::path::{Path, PathBuf};

use prox_core::record::parse_label;
use prox_core::{industry_name, ColumnSchema, ErrorInfo, ProxError, Table, ADJACENT_COUNT, AVG_NEAREST_DISTANCE};
use prox_stats::LogisticOptions;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dispatch::{discover_tables, file_label, for_each_table, PROXIMITY_REPORT};
use crate::inference::{logistic_by_industry, welch_by_industry};
use crate::plan::{ensure_input_dir, ensure_output_dir};
use crate::report::RunReport;
use crate::summary::{industry_counts, survival_by_metric};

/// Derived metric analysed by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Time-averaged nearest competitor distance.
    Distance,
    /// Competitors within the adjacency radius.
    Adjacency,
}

impl Metric {
    /// Both metrics in report order.
    pub const ALL: [Metric; 2] = [Metric::Distance, Metric::Adjacency];

    /// Table column holding the metric.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Distance => AVG_NEAREST_DISTANCE,
            Metric::Adjacency => ADJACENT_COUNT,
        }
    }

    /// Short name used in report file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Metric::Distance => "distance",
            Metric::Adjacency => "adjacency",
        }
    }
}

/// The columns of one enriched table that the reports read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndustryFrame {
    /// Industry derived from the file name.
    pub industry: String,
    /// Source file name.
    pub file: String,
    /// Survival label per row; `None` when absent or unparseable.
    pub survival: Vec<Option<bool>>,
    /// Average nearest distance per row; `None` when blank.
    pub distance: Vec<Option<f64>>,
    /// Adjacent count per row; `None` when blank.
    pub adjacency: Vec<Option<f64>>,
}

impl IndustryFrame {
    /// Extracts the report columns of `table`; absent columns read as blanks.
    pub fn from_table(industry: String, file: String, table: &Table, schema: &ColumnSchema) -> Self {
        let rows = table.len();
        let numbers = |name: &str| -> Vec<Option<f64>> {
            match table.column_index(name) {
                Some(col) => (0..rows).map(|row| parse_number(table.cell(row, col))).collect(),
                None => vec![None; rows],
            }
        };
        let survival = match table.column_index(&schema.survival) {
            Some(col) => (0..rows).map(|row| parse_label(table.cell(row, col))).collect(),
            None => vec![None; rows],
        };
        Self {
            industry,
            file,
            survival,
            distance: numbers(AVG_NEAREST_DISTANCE),
            adjacency: numbers(ADJACENT_COUNT),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.survival.len()
    }

    /// Values of `metric` per row.
    pub fn metric(&self, metric: Metric) -> &[Option<f64>] {
        match metric {
            Metric::Distance => &self.distance,
            Metric::Adjacency => &self.adjacency,
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Loads every table under `input`; unreadable tables are logged and left out.
///
/// When `input` holds a `proximity_report.json`, only the tables that run
/// wrote are loaded.
pub fn load_frames(input: &Path, schema: &ColumnSchema, concurrency: usize) -> Result<Vec<IndustryFrame>, ProxError> {
    let mut tables = discover_tables(input)?;
    let report_path = input.join(PROXIMITY_REPORT);
    if report_path.is_file() {
        match RunReport::load(&report_path) {
            Ok(report) => {
                let written = report.written_files();
                tables.retain(|path| {
                    let file = file_label(path);
                    let keep = written.contains(file.as_str());
                    if !keep {
                        warn!(%file, "not written by the last proximity run, left out");
                    }
                    keep
                });
            }
            Err(err) => warn!(error = %err, "proximity report unreadable, loading every table"),
        }
    }
    let frames = for_each_table(&tables, concurrency, |path| {
        let file = file_label(path);
        Table::read_csv(path)
            .map(|table| IndustryFrame::from_table(industry_name(path), file.clone(), &table, schema))
            .map_err(|err| {
                error!(%file, error = %err, "table unreadable");
                err
            })
            .ok()
    })?;
    Ok(frames.into_iter().flatten().collect())
}

/// Report files produced by [`run_reports`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSet {
    /// Tables included in the reports.
    pub tables: usize,
    /// Files written, in creation order.
    pub files: Vec<PathBuf>,
}

/// Writes the industry, survival and inference reports for the tables under `input`.
pub fn run_reports(
    input: &Path,
    output: &Path,
    schema: &ColumnSchema,
    concurrency: usize,
) -> Result<ReportSet, ProxError> {
    ensure_input_dir(input)?;
    ensure_output_dir(output)?;
    let frames = load_frames(input, schema, concurrency)?;
    let mut files = Vec::new();

    let path = output.join("industry_counts.csv");
    write_rows(&path, &industry_counts(&frames))?;
    files.push(path);

    for metric in Metric::ALL {
        let path = output.join(format!("survival_by_{}.csv", metric.slug()));
        write_rows(&path, &survival_by_metric(&frames, metric))?;
        files.push(path);
    }
    for metric in Metric::ALL {
        let path = output.join(format!("ttest_{}.csv", metric.slug()));
        write_rows(&path, &welch_by_industry(&frames, metric))?;
        files.push(path);
    }
    let path = output.join("logistic_summary.csv");
    write_rows(&path, &logistic_by_industry(&frames, &LogisticOptions::default()))?;
    files.push(path);

    info!(tables = frames.len(), files = files.len(), "reports written");
    Ok(ReportSet {
        tables: frames.len(),
        files,
    })
}

/// Writes serializable rows as CSV with a header taken from the field names.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ProxError> {
    let csv_error = |err: csv::Error| {
        ProxError::Io(ErrorInfo::new("report_csv", err.to_string()).with_context("path", path.display().to_string()))
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|err| ProxError::io("report_flush", path, err))
}
