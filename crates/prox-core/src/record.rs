//! Business records extracted from an industry table.

use serde::{Deserialize, Serialize};

use crate::columns::ColumnSchema;
use crate::errors::ProxError;
use crate::table::Table;

/// Planar coordinate in the projected reference system of the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl Location {
    /// Creates a location from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parses a coordinate pair; `None` when either cell is blank,
    /// unparseable or non-finite.
    pub fn parse(x: &str, y: &str) -> Option<Self> {
        let x = x.trim().parse::<f64>().ok()?;
        let y = y.trim().parse::<f64>().ok()?;
        let location = Self::new(x, y);
        location.is_finite().then_some(location)
    }

    /// Returns true when both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Squared Euclidean distance.
    pub fn distance_squared(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &Location) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// One row of an industry table as seen by the proximity engine.
///
/// Dates are kept as raw cells; the interval reconstructor decides how
/// unparseable values are treated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Zero-based row index in the source table; the identity used for
    /// self-exclusion.
    pub row: usize,
    /// Business name.
    pub id: String,
    /// Raw permit date cell.
    pub permit_date: String,
    /// Raw closure date cell.
    pub closure_date: String,
    /// Parsed location; `None` when missing or non-finite.
    pub location: Option<Location>,
    /// Upstream survival label when the column is present and parseable.
    pub survival_label: Option<bool>,
}

/// Parses a boolean label cell (`true`/`false`/`1`/`0`, case-insensitive).
pub fn parse_label(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(true),
        "false" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// Extracts proximity records from a table, failing when a required column is absent.
pub fn extract_records(table: &Table, schema: &ColumnSchema) -> Result<Vec<BusinessRecord>, ProxError> {
    let required = table.require_columns(&schema.proximity_required())?;
    let (permit, closure, x, y, identity) =
        (required[0], required[1], required[2], required[3], required[4]);
    let survival = table.column_index(&schema.survival);
    let records = (0..table.len())
        .map(|row| BusinessRecord {
            row,
            id: table.cell(row, identity).to_string(),
            permit_date: table.cell(row, permit).to_string(),
            closure_date: table.cell(row, closure).to_string(),
            location: Location::parse(table.cell(row, x), table.cell(row, y)),
            survival_label: survival.and_then(|col| parse_label(table.cell(row, col))),
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(Location::parse("1.5", "2").is_some());
        assert!(Location::parse("", "2").is_none());
        assert!(Location::parse("NaN", "2").is_none());
        assert!(Location::parse("inf", "2").is_none());
    }

    #[test]
    fn labels_accept_pandas_spelling() {
        assert_eq!(parse_label("True"), Some(true));
        assert_eq!(parse_label("0"), Some(false));
        assert_eq!(parse_label("maybe"), None);
    }
}
