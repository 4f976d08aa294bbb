//! Operating interval reconstruction and monthly checkpoint sampling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use prox_core::date::{format_date, month_start, next_month_start, parse_date};
use prox_core::errors::{ErrorInfo, ProxError, INVERTED_INTERVAL};

/// Closed date range `[start, end]` during which a business operated.
///
/// Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatingInterval {
    start: NaiveDate,
    end: NaiveDate,
}

/// Where the end of an interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosureSource {
    /// The record carried a parseable closure date.
    Recorded,
    /// The closure cell was blank; the horizon was used.
    Open,
    /// The closure cell was not a date; the horizon was used.
    Defaulted,
}

/// Result of reconstructing one record's interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconstruction {
    /// The accepted interval.
    pub interval: OperatingInterval,
    /// Provenance of the interval end.
    pub closure: ClosureSource,
}

impl OperatingInterval {
    /// Creates an interval, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ProxError> {
        if end < start {
            return Err(ProxError::Record(
                ErrorInfo::new(INVERTED_INTERVAL, "closure date precedes permit date")
                    .with_context("start", format_date(start))
                    .with_context("end", format_date(end)),
            ));
        }
        Ok(Self { start, end })
    }

    /// Builds the interval from raw permit and closure cells.
    ///
    /// An unparseable permit date is an error. A blank or unparseable
    /// closure date falls back to `horizon`.
    pub fn reconstruct(
        permit: &str,
        closure: &str,
        horizon: NaiveDate,
    ) -> Result<Reconstruction, ProxError> {
        let start = parse_date(permit)?;
        let (end, source) = if closure.trim().is_empty() {
            (horizon, ClosureSource::Open)
        } else {
            match parse_date(closure) {
                Ok(date) => (date, ClosureSource::Recorded),
                Err(_) => (horizon, ClosureSource::Defaulted),
            }
        };
        Ok(Reconstruction {
            interval: Self::new(start, end)?,
            closure: source,
        })
    }

    /// First operating day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last operating day.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when `date` lies in `[start, end]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// First-of-month dates from the start month through the end month.
    pub fn checkpoints(&self) -> Checkpoints {
        Checkpoints {
            next: Some(month_start(self.start)),
            last: month_start(self.end),
        }
    }

    /// `start~end` text form written to the `operating_period` column.
    pub fn period_string(&self) -> String {
        format!("{}~{}", format_date(self.start), format_date(self.end))
    }
}

/// Iterator over the monthly checkpoints of an interval.
#[derive(Debug, Clone)]
pub struct Checkpoints {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for Checkpoints {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|date| *date <= self.last)?;
        self.next = next_month_start(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_month_yields_one_checkpoint() {
        let interval = OperatingInterval::new(date(2016, 6, 15), date(2016, 6, 20)).unwrap();
        let points: Vec<_> = interval.checkpoints().collect();
        assert_eq!(points, vec![date(2016, 6, 1)]);
    }

    #[test]
    fn blank_and_garbage_closures_use_horizon() {
        let horizon = date(2019, 12, 31);
        let open = OperatingInterval::reconstruct("2016-01-01", " ", horizon).unwrap();
        assert_eq!(open.closure, ClosureSource::Open);
        assert_eq!(open.interval.end(), horizon);
        let garbage = OperatingInterval::reconstruct("2016-01-01", "unknown", horizon).unwrap();
        assert_eq!(garbage.closure, ClosureSource::Defaulted);
        assert_eq!(garbage.interval.period_string(), "2016-01-01~2019-12-31");
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let err = OperatingInterval::reconstruct("2017-01-01", "2016-12-31", date(2019, 12, 31))
            .unwrap_err();
        assert_eq!(err.code(), INVERTED_INTERVAL);
    }
}
