//! In-memory CSV table with raw string cells.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};

use crate::errors::{ErrorInfo, ProxError, MISSING_REQUIRED_COLUMN};

const BOM: char = '\u{feff}';

/// One industry table: a header row and rows of raw cells.
///
/// Every row has exactly `headers.len()` cells; short lines are padded with
/// empty cells, lines with more fields than the header are truncated to the
/// header width and their row indices recorded in [`Table::truncated_rows`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names in file order.
    pub headers: Vec<String>,
    /// Row cells in file order.
    pub rows: Vec<Vec<String>>,
    /// Rows read from lines with more fields than the header, in row order.
    pub truncated_rows: Vec<usize>,
}

fn csv_error(code: &str, path: Option<&Path>, err: impl ToString) -> ProxError {
    let mut info = ErrorInfo::new(code, err.to_string());
    if let Some(path) = path {
        info = info.with_context("path", path.display().to_string());
    }
    ProxError::Io(info)
}

impl Table {
    /// Creates an empty table with the given header.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            truncated_rows: Vec::new(),
        }
    }

    /// Reads a UTF-8 CSV file, stripping a leading byte-order mark.
    pub fn read_csv(path: &Path) -> Result<Self, ProxError> {
        let file = fs::File::open(path).map_err(|err| ProxError::io("table_open", path, err))?;
        Self::from_reader(file).map_err(|err| match err {
            ProxError::Io(info) => {
                ProxError::Io(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Reads CSV content from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProxError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| csv_error("table_header", None, err))?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if idx == 0 {
                    name.trim_start_matches(BOM).to_string()
                } else {
                    name.to_string()
                }
            })
            .collect::<Vec<_>>();
        let width = headers.len();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record.map_err(|err| csv_error("table_row", None, err))?;
            if record.len() > width {
                table.truncated_rows.push(table.rows.len());
            }
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Writes the table to `path` through a temporary sibling file renamed into place.
    pub fn write_csv(&self, path: &Path) -> Result<(), ProxError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| ProxError::io("table_dir", parent, err))?;
        }
        let tmp = temporary_path(path);
        let file = fs::File::create(&tmp).map_err(|err| ProxError::io("table_create", &tmp, err))?;
        self.to_writer(file).map_err(|err| match err {
            ProxError::Io(info) => ProxError::Io(info.with_context("path", tmp.display().to_string())),
            other => other,
        })?;
        fs::rename(&tmp, path).map_err(|err| ProxError::io("table_rename", path, err))
    }

    /// Writes the table as CSV into any writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ProxError> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer
            .write_record(&self.headers)
            .map_err(|err| csv_error("table_write_header", None, err))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| csv_error("table_write_row", None, err))?;
        }
        writer
            .flush()
            .map_err(|err| csv_error("table_flush", None, err))
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Resolves every named column, failing with `missing_required_column`
    /// listing all absent names.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, ProxError> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(*name),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(ProxError::Schema(
                ErrorInfo::new(MISSING_REQUIRED_COLUMN, "table lacks required columns")
                    .with_context("missing", missing.join(", ")),
            ))
        }
    }

    /// Cell at `row`, `col`; empty when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Overwrites the named column or appends it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), ProxError> {
        if values.len() != self.rows.len() {
            return Err(ProxError::Schema(
                ErrorInfo::new("column_length", "column length differs from row count")
                    .with_context("column", name)
                    .with_context("rows", self.rows.len().to_string())
                    .with_context("values", values.len().to_string()),
            ));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Industry label of a table: the last `_`-separated token of the file stem.
pub fn industry_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    stem.rsplit('_').next().unwrap_or(stem).to_string()
}
