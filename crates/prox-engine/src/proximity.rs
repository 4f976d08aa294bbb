//! Time-averaged nearest competitor distance per record.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use prox_core::errors::{ProxError, INVALID_COORDINATE, INVERTED_INTERVAL};
use prox_core::BusinessRecord;

use crate::interval::{ClosureSource, OperatingInterval};
use crate::timeline::{Subject, Timeline};

/// Reason a record was excluded from distance and adjacency computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFlag {
    /// Permit date blank or not `YYYY-MM-DD`.
    MalformedPermitDate,
    /// Closure date earlier than the permit date.
    InvertedInterval,
    /// Coordinate missing, unparseable or non-finite.
    InvalidCoordinate,
}

impl RecordFlag {
    /// Value written to the `proximity_flag` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordFlag::MalformedPermitDate => "malformed_permit_date",
            RecordFlag::InvertedInterval => INVERTED_INTERVAL,
            RecordFlag::InvalidCoordinate => INVALID_COORDINATE,
        }
    }

    fn from_error(err: &ProxError) -> Self {
        if err.code() == INVERTED_INTERVAL {
            RecordFlag::InvertedInterval
        } else {
            RecordFlag::MalformedPermitDate
        }
    }
}

/// Engine output for one record, aligned with the input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordProximity {
    /// Row index in the source table.
    pub row: usize,
    /// Reconstructed interval, absent when the dates were rejected.
    pub interval: Option<OperatingInterval>,
    /// Provenance of the interval end.
    pub closure: Option<ClosureSource>,
    /// Exclusion reason; `None` for accepted records.
    pub flag: Option<RecordFlag>,
    /// Mean nearest competitor distance; `None` for flagged records.
    pub avg_nearest_distance: Option<f64>,
    /// Monthly checkpoints of the interval.
    pub checkpoints: usize,
    /// Checkpoints at which at least one competitor was active.
    pub samples: usize,
}

/// Engine output for a whole table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProximityOutcome {
    /// Per-record results in input order.
    pub records: Vec<RecordProximity>,
    /// Spatial indices built while sweeping the table.
    pub index_builds: usize,
}

impl ProximityOutcome {
    /// Records that took part in the distance computation.
    pub fn accepted(&self) -> impl Iterator<Item = &RecordProximity> {
        self.records.iter().filter(|record| record.flag.is_none())
    }

    /// Number of records carrying `flag`.
    pub fn flagged(&self, flag: RecordFlag) -> usize {
        self.records
            .iter()
            .filter(|record| record.flag == Some(flag))
            .count()
    }

    /// Arithmetic mean of the accepted records' distances; `None` when nothing was accepted.
    pub fn mean_distance(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for distance in self.accepted().filter_map(|record| record.avg_nearest_distance) {
            sum += distance;
            count += 1;
        }
        (count > 0).then(|| sum / count as f64)
    }
}

/// Computes, for every record, the distance to the nearest concurrently
/// operating competitor at each monthly checkpoint, averaged over the
/// record's operating interval.
///
/// Competitors are the other accepted records of the same table; a record is
/// never its own competitor (identity is the row index). A record with no
/// competitor at any checkpoint averages to `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityEngine {
    horizon: NaiveDate,
}

impl ProximityEngine {
    /// Creates an engine closing open businesses at `horizon`.
    pub fn new(horizon: NaiveDate) -> Self {
        Self { horizon }
    }

    /// Analysis cutoff date.
    pub fn horizon(&self) -> NaiveDate {
        self.horizon
    }

    /// Runs the engine over one table's records.
    pub fn run(&self, records: &[BusinessRecord]) -> ProximityOutcome {
        let mut results = Vec::with_capacity(records.len());
        let mut subjects = Vec::new();
        for record in records {
            let mut result = RecordProximity {
                row: record.row,
                interval: None,
                closure: None,
                flag: None,
                avg_nearest_distance: None,
                checkpoints: 0,
                samples: 0,
            };
            match OperatingInterval::reconstruct(
                &record.permit_date,
                &record.closure_date,
                self.horizon,
            ) {
                Ok(reconstruction) => {
                    result.interval = Some(reconstruction.interval);
                    result.closure = Some(reconstruction.closure);
                    result.checkpoints = reconstruction.interval.checkpoints().count();
                    match record.location {
                        Some(location) => subjects.push(Subject {
                            id: record.row,
                            interval: reconstruction.interval,
                            location,
                        }),
                        None => {
                            warn!(row = record.row, id = %record.id, "invalid coordinate, record excluded");
                            result.flag = Some(RecordFlag::InvalidCoordinate);
                        }
                    }
                }
                Err(err) => {
                    warn!(row = record.row, id = %record.id, error = %err, "interval rejected, record excluded");
                    result.flag = Some(RecordFlag::from_error(&err));
                }
            }
            results.push(result);
        }

        let timeline = Timeline::build(&subjects);
        let averages: Vec<(f64, usize)> = subjects
            .par_iter()
            .map(|subject| average_nearest(subject, &timeline))
            .collect();

        // Subjects were pushed in row order, so a single forward pass realigns them.
        let mut averages = subjects.iter().zip(averages).peekable();
        for result in &mut results {
            if let Some((subject, (distance, samples))) =
                averages.next_if(|(subject, _)| subject.id == result.row)
            {
                debug!(row = subject.id, distance, samples, "average nearest distance");
                result.avg_nearest_distance = Some(distance);
                result.samples = samples;
            }
        }

        ProximityOutcome {
            records: results,
            index_builds: timeline.index_builds(),
        }
    }
}

fn average_nearest(subject: &Subject, timeline: &Timeline) -> (f64, usize) {
    let mut sum = 0.0;
    let mut samples = 0usize;
    for checkpoint in subject.interval.checkpoints() {
        let nearest = timeline
            .index_at(checkpoint)
            .and_then(|index| index.nearest(&subject.location, Some(subject.id)));
        if let Some(neighbor) = nearest {
            sum += neighbor.distance;
            samples += 1;
        }
    }
    if samples == 0 {
        (0.0, 0)
    } else {
        (sum / samples as f64, samples)
    }
}
