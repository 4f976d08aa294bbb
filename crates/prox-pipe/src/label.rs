use std::path::Path;

use prox_core::{industry_name, parse_date, ColumnSchema, ProxError, Table};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dispatch::{discover_tables, file_label, for_each_table};
use crate::plan::{ensure_input_dir, ensure_output_dir};

/// Rule deciding whether a business survived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// Status of a business that is still operating.
    #[serde(default = "LabelSpec::default_open_status")]
    pub open_status: String,
    /// Status of a closed business.
    #[serde(default = "LabelSpec::default_closed_status")]
    pub closed_status: String,
    /// A closed business survived when it operated strictly longer than this many years.
    #[serde(default = "LabelSpec::default_min_years")]
    pub min_years: f64,
}

impl LabelSpec {
    fn default_open_status() -> String {
        "영업/정상".to_string()
    }
    fn default_closed_status() -> String {
        "폐업".to_string()
    }
    fn default_min_years() -> f64 {
        3.0
    }

    /// Survival of one business from its status and dates.
    ///
    /// Years are counted as elapsed days over 365. Closed rows with an
    /// unparseable date, and any other status, are not survivors.
    pub fn survived(&self, status: &str, permit: &str, closure: &str) -> bool {
        let status = status.trim();
        if status == self.open_status {
            return true;
        }
        if status != self.closed_status {
            return false;
        }
        match (parse_date(permit), parse_date(closure)) {
            (Ok(start), Ok(end)) => (end - start).num_days() as f64 / 365.0 > self.min_years,
            _ => false,
        }
    }

    /// Writes the survival column into `table`, returning the number of survivors.
    pub fn apply(&self, table: &mut Table, schema: &ColumnSchema) -> Result<usize, ProxError> {
        let columns = table.require_columns(&[
            schema.status.as_str(),
            schema.permit_date.as_str(),
            schema.closure_date.as_str(),
        ])?;
        let (status, permit, closure) = (columns[0], columns[1], columns[2]);
        let labels: Vec<bool> = (0..table.len())
            .map(|row| {
                self.survived(
                    table.cell(row, status),
                    table.cell(row, permit),
                    table.cell(row, closure),
                )
            })
            .collect();
        let survivors = labels.iter().filter(|label| **label).count();
        table.set_column(
            &schema.survival,
            labels.into_iter().map(|label| label.to_string()).collect(),
        )?;
        Ok(survivors)
    }
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            open_status: Self::default_open_status(),
            closed_status: Self::default_closed_status(),
            min_years: Self::default_min_years(),
        }
    }
}

/// Labelling result for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelOutcome {
    /// File name of the table.
    pub file: String,
    /// Industry derived from the file name.
    pub industry: String,
    /// Rows labelled.
    pub rows: usize,
    /// Rows labelled as survivors.
    pub survived: usize,
    /// Error that prevented labelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProxError>,
}

/// Labels every table under `input` and writes it to `output`.
pub fn run_labeling(
    input: &Path,
    output: &Path,
    schema: &ColumnSchema,
    spec: &LabelSpec,
    concurrency: usize,
) -> Result<Vec<LabelOutcome>, ProxError> {
    ensure_input_dir(input)?;
    ensure_output_dir(output)?;
    let tables = discover_tables(input)?;
    let outcomes = for_each_table(&tables, concurrency, |path| label_table(path, output, schema, spec))?;
    let labelled = outcomes.iter().filter(|outcome| outcome.error.is_none()).count();
    info!(tables = outcomes.len(), labelled, "label stage finished");
    Ok(outcomes)
}

fn label_table(path: &Path, output: &Path, schema: &ColumnSchema, spec: &LabelSpec) -> LabelOutcome {
    let mut outcome = LabelOutcome {
        file: file_label(path),
        industry: industry_name(path),
        rows: 0,
        survived: 0,
        error: None,
    };
    let result = Table::read_csv(path).and_then(|mut table| {
        outcome.rows = table.len();
        outcome.survived = spec.apply(&mut table, schema)?;
        table.write_csv(&output.join(&outcome.file))
    });
    match result {
        Ok(()) => {}
        Err(err @ ProxError::Schema(_)) => {
            warn!(file = %outcome.file, error = %err, "table skipped");
            outcome.error = Some(err);
        }
        Err(err) => {
            error!(file = %outcome.file, error = %err, "table failed");
            outcome.error = Some(err);
        }
    }
    outcome
}
