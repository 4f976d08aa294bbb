use std::path::Path;

use prox_core::{industry_name, ColumnSchema, ProxError, Table};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dispatch::{discover_tables, file_label, for_each_table};
use crate::plan::{ensure_input_dir, ensure_output_dir};

/// Row and table filters applied before labelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Keep rows whose address contains this text.
    #[serde(default)]
    pub address_contains: Option<String>,
    /// Keep rows whose permit date falls in this year.
    #[serde(default)]
    pub permit_year: Option<i32>,
    /// Keep rows whose status is listed; an empty list keeps every status.
    #[serde(default = "FilterSpec::default_statuses")]
    pub statuses: Vec<String>,
    /// Status value of a closed business.
    #[serde(default = "FilterSpec::default_closed_status")]
    pub closed_status: String,
    /// Drop closed rows that carry no closure date.
    #[serde(default = "FilterSpec::default_drop_closed_without_date")]
    pub drop_closed_without_date: bool,
    /// Tables with this many rows or fewer after filtering are not written.
    #[serde(default = "FilterSpec::default_min_rows")]
    pub min_rows: usize,
}

impl FilterSpec {
    fn default_statuses() -> Vec<String> {
        vec!["폐업".to_string(), "영업/정상".to_string()]
    }
    fn default_closed_status() -> String {
        "폐업".to_string()
    }
    fn default_drop_closed_without_date() -> bool {
        true
    }
    fn default_min_rows() -> usize {
        50
    }

    /// Removes the rows of `table` that fail any configured predicate.
    pub fn apply(&self, table: &mut Table, schema: &ColumnSchema) -> Result<(), ProxError> {
        let mut needed: Vec<&str> = Vec::new();
        if self.address_contains.is_some() {
            needed.push(&schema.address);
        }
        if self.permit_year.is_some() {
            needed.push(&schema.permit_date);
        }
        if !self.statuses.is_empty() || self.drop_closed_without_date {
            needed.push(&schema.status);
        }
        if self.drop_closed_without_date {
            needed.push(&schema.closure_date);
        }
        table.require_columns(&needed)?;

        let address = table.column_index(&schema.address);
        let permit = table.column_index(&schema.permit_date);
        let status = table.column_index(&schema.status);
        let closure = table.column_index(&schema.closure_date);
        let year = self.permit_year.map(|year| year.to_string());

        table.retain_rows(|row| {
            let cell = |col: Option<usize>| col.and_then(|col| row.get(col)).map(String::as_str).unwrap_or("");
            if let Some(needle) = &self.address_contains {
                if !cell(address).contains(needle.as_str()) {
                    return false;
                }
            }
            if let Some(year) = &year {
                if cell(permit).trim().split('-').next() != Some(year.as_str()) {
                    return false;
                }
            }
            let state = cell(status).trim();
            if !self.statuses.is_empty() && !self.statuses.iter().any(|allowed| allowed == state) {
                return false;
            }
            if self.drop_closed_without_date
                && state == self.closed_status
                && cell(closure).trim().is_empty()
            {
                return false;
            }
            true
        });
        Ok(())
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            address_contains: None,
            permit_year: None,
            statuses: Self::default_statuses(),
            closed_status: Self::default_closed_status(),
            drop_closed_without_date: Self::default_drop_closed_without_date(),
            min_rows: Self::default_min_rows(),
        }
    }
}

/// What happened to one table in the filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterDisposition {
    /// Written to the output directory.
    Written,
    /// Too few rows left after filtering.
    TooSmall,
    /// A column needed by the filters is missing.
    Skipped,
    /// Read or write error.
    Failed,
}

/// Filter stage result for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// File name of the table.
    pub file: String,
    /// Industry derived from the file name.
    pub industry: String,
    /// Rows read.
    pub rows_in: usize,
    /// Rows left after filtering.
    pub rows_kept: usize,
    /// Table disposition.
    pub disposition: FilterDisposition,
    /// Error behind a skipped or failed table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProxError>,
}

/// Filters every table under `input` into `output`, keeping file names.
pub fn run_filter(
    input: &Path,
    output: &Path,
    schema: &ColumnSchema,
    spec: &FilterSpec,
    concurrency: usize,
) -> Result<Vec<FilterOutcome>, ProxError> {
    ensure_input_dir(input)?;
    ensure_output_dir(output)?;
    let tables = discover_tables(input)?;
    let outcomes = for_each_table(&tables, concurrency, |path| filter_table(path, output, schema, spec))?;
    let written = outcomes
        .iter()
        .filter(|outcome| outcome.disposition == FilterDisposition::Written)
        .count();
    info!(tables = outcomes.len(), written, "filter stage finished");
    Ok(outcomes)
}

fn filter_table(path: &Path, output: &Path, schema: &ColumnSchema, spec: &FilterSpec) -> FilterOutcome {
    let mut outcome = FilterOutcome {
        file: file_label(path),
        industry: industry_name(path),
        rows_in: 0,
        rows_kept: 0,
        disposition: FilterDisposition::Failed,
        error: None,
    };
    let mut table = match Table::read_csv(path) {
        Ok(table) => table,
        Err(err) => {
            error!(file = %outcome.file, error = %err, "table unreadable");
            outcome.error = Some(err);
            return outcome;
        }
    };
    outcome.rows_in = table.len();
    if let Err(err) = spec.apply(&mut table, schema) {
        warn!(file = %outcome.file, error = %err, "table skipped");
        outcome.disposition = FilterDisposition::Skipped;
        outcome.error = Some(err);
        return outcome;
    }
    outcome.rows_kept = table.len();
    if table.len() <= spec.min_rows {
        info!(file = %outcome.file, rows = table.len(), min_rows = spec.min_rows, "table too small");
        outcome.disposition = FilterDisposition::TooSmall;
        return outcome;
    }
    match table.write_csv(&output.join(&outcome.file)) {
        Ok(()) => outcome.disposition = FilterDisposition::Written,
        Err(err) => {
            error!(file = %outcome.file, error = %err, "table not written");
            outcome.error = Some(err);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut table = Table::new(
            ["소재지전체주소", "인허가일자", "영업상태명", "폐업일자"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
        );
        for row in [
            ["서울특별시 강남구 역삼동", "2016-03-02", "영업/정상", ""],
            ["서울특별시 강남구 삼성동", "2016-07-11", "폐업", "2018-01-05"],
            ["서울특별시 강남구 논현동", "2016-09-30", "폐업", ""],
            ["서울특별시 서초구 서초동", "2016-01-15", "영업/정상", ""],
            ["서울특별시 강남구 역삼동", "2015-12-31", "영업/정상", ""],
            ["서울특별시 강남구 청담동", "2016-05-05", "휴업", ""],
        ] {
            table.rows.push(row.iter().map(|cell| cell.to_string()).collect());
        }
        table
    }

    #[test]
    fn predicates_combine() {
        let spec = FilterSpec {
            address_contains: Some("강남구".to_string()),
            permit_year: Some(2016),
            ..FilterSpec::default()
        };
        let mut table = table();
        spec.apply(&mut table, &ColumnSchema::default()).unwrap();
        let kept: Vec<&str> = table.rows.iter().map(|row| row[1].as_str()).collect();
        assert_eq!(kept, vec!["2016-03-02", "2016-07-11"]);
    }

    #[test]
    fn empty_status_list_keeps_every_status() {
        let spec = FilterSpec {
            statuses: Vec::new(),
            drop_closed_without_date: false,
            ..FilterSpec::default()
        };
        let mut table = table();
        spec.apply(&mut table, &ColumnSchema::default()).unwrap();
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn missing_status_column_is_a_schema_error() {
        let mut table = Table::new(vec!["인허가일자".to_string()]);
        let err = FilterSpec::default()
            .apply(&mut table, &ColumnSchema::default())
            .unwrap_err();
        assert_eq!(err.code(), prox_core::errors::MISSING_REQUIRED_COLUMN);
    }
}
