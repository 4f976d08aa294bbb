use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use prox_core::{ProxError, RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::metrics::TableMetrics;
use crate::plan::PipelineConfig;
use crate::serde::from_json_slice;

/// Outcome class of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableState {
    /// Enriched without flagged or truncated rows.
    Complete,
    /// Enriched; some rows were flagged and excluded, or truncated on read.
    Partial,
    /// Not processed because a required column is missing.
    Skipped,
    /// Read, processing or write error.
    Failed,
    /// Not finished because the run was cancelled.
    Cancelled,
}

/// State of a table plus the error that caused it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatus {
    /// Outcome class.
    pub state: TableState,
    /// Error behind a skipped or failed table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProxError>,
}

impl TableStatus {
    /// Status of a table that was enriched and written.
    pub fn finished(metrics: &TableMetrics) -> Self {
        let state = if metrics.flagged_total() == 0 && metrics.malformed_lines == 0 {
            TableState::Complete
        } else {
            TableState::Partial
        };
        Self { state, error: None }
    }

    /// Status of a table lacking required columns.
    pub fn skipped(error: ProxError) -> Self {
        Self {
            state: TableState::Skipped,
            error: Some(error),
        }
    }

    /// Status of a table that could not be processed.
    pub fn failed(error: ProxError) -> Self {
        Self {
            state: TableState::Failed,
            error: Some(error),
        }
    }

    /// Status of a table abandoned on cancellation.
    pub fn cancelled() -> Self {
        Self {
            state: TableState::Cancelled,
            error: None,
        }
    }
}

/// Report entry for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    /// File name of the table.
    pub file: String,
    /// Industry derived from the file name.
    pub industry: String,
    /// Execution status.
    pub status: TableStatus,
    /// Counters; zeroed for tables that were not enriched.
    #[serde(default)]
    pub metrics: TableMetrics,
}

impl TableReport {
    /// Report entry without metrics.
    pub fn new(file: String, industry: String, status: TableStatus) -> Self {
        Self {
            file,
            industry,
            status,
            metrics: TableMetrics::default(),
        }
    }

    /// Attaches the counters of an enriched table.
    pub fn with_metrics(mut self, metrics: TableMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Aggregate counts over all tables of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunTotals {
    /// Tables discovered.
    pub tables: usize,
    /// Tables enriched without flagged or truncated rows.
    pub complete: usize,
    /// Tables enriched with some flagged or truncated rows.
    pub partial: usize,
    /// Tables skipped for missing columns.
    pub skipped: usize,
    /// Tables that failed.
    pub failed: usize,
    /// Tables not finished because of cancellation.
    pub cancelled: usize,
    /// Rows across enriched tables.
    pub rows: usize,
    /// Accepted rows across enriched tables.
    pub accepted: usize,
    /// Flagged rows across enriched tables, keyed by flag name.
    pub flagged: BTreeMap<String, usize>,
}

impl RunTotals {
    /// Sums the per-table entries.
    pub fn from_tables(tables: &[TableReport]) -> Self {
        let mut totals = Self {
            tables: tables.len(),
            ..Self::default()
        };
        for table in tables {
            match table.status.state {
                TableState::Complete => totals.complete += 1,
                TableState::Partial => totals.partial += 1,
                TableState::Skipped => totals.skipped += 1,
                TableState::Failed => totals.failed += 1,
                TableState::Cancelled => totals.cancelled += 1,
            }
            totals.rows += table.metrics.rows;
            totals.accepted += table.metrics.accepted;
            for (flag, count) in &table.metrics.flagged {
                *totals.flagged.entry(flag.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    /// Tables that produced an enriched output.
    pub fn succeeded(&self) -> usize {
        self.complete + self.partial
    }
}

/// Report of one proximity run, written as `proximity_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Canonical hash of the configuration.
    pub config_hash: String,
    /// Per-table entries in discovery order.
    pub tables: Vec<TableReport>,
    /// Aggregate counts.
    pub totals: RunTotals,
    /// Provenance metadata.
    pub provenance: RunProvenance,
}

impl RunReport {
    /// Assembles the report for `tables` produced under `config`.
    pub fn new(config: &PipelineConfig, tables: Vec<TableReport>) -> Result<Self, ProxError> {
        let provenance = provenance(config)?;
        Ok(Self {
            config_hash: provenance.config_hash.clone(),
            totals: RunTotals::from_tables(&tables),
            tables,
            provenance,
        })
    }

    /// Reads a report written by a previous proximity run.
    pub fn load(path: &Path) -> Result<Self, ProxError> {
        let bytes = fs::read(path).map_err(|err| ProxError::io("report_read", path, err))?;
        from_json_slice(&bytes)
    }

    /// File names of the tables the run enriched and wrote.
    pub fn written_files(&self) -> BTreeSet<&str> {
        self.tables
            .iter()
            .filter(|table| matches!(table.status.state, TableState::Complete | TableState::Partial))
            .map(|table| table.file.as_str())
            .collect()
    }
}

/// Provenance block stamped with the current time.
pub fn provenance(config: &PipelineConfig) -> Result<RunProvenance, ProxError> {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "prox-pipe".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        schema_version: SchemaVersion::default(),
        config_hash: config.config_hash()?,
        horizon: config.horizon.clone(),
        created_at: Utc::now().to_rfc3339(),
        tool_versions,
    })
}
