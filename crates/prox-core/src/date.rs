//! Calendar date helpers for the `YYYY-MM-DD` columns.

use chrono::{Datelike, Months, NaiveDate};

use crate::errors::{ErrorInfo, ProxError, MALFORMED_DATE};

/// Text format of every date column read or written by the pipeline.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` cell, trimming surrounding whitespace.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ProxError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|err| {
        ProxError::Date(
            ErrorInfo::new(MALFORMED_DATE, err.to_string()).with_context("value", trimmed),
        )
    })
}

/// Formats a date back into the `YYYY-MM-DD` column form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Returns the first day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Returns the first day of the month after `date`'s month.
pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).checked_add_months(Months::new(1))
}

/// Number of whole calendar months from `from`'s month to `to`'s month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let from_index = i64::from(from.year()) * 12 + i64::from(from.month0());
    let to_index = i64::from(to.year()) * 12 + i64::from(to.month0());
    to_index - from_index
}
