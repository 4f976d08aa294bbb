//! Same-industry neighbour counts within the table-wide mean distance.

use rayon::prelude::*;

use prox_core::BusinessRecord;

use crate::kdtree::{IndexedPoint, KdTree};
use crate::proximity::ProximityOutcome;

/// Adjacency counts for one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdjacencyOutcome {
    /// Radius used for every record: the mean of the accepted distances.
    pub radius: f64,
    /// Per-record neighbour count in input order; `None` for flagged records.
    pub counts: Vec<Option<usize>>,
}

/// Counts, for every accepted record, the other accepted records lying within
/// the adjacency radius (inclusive).
///
/// Only accepted records take part, as centres and as neighbours. A record
/// with a valid coordinate but a flagged interval is left out, so a table
/// with fewer than two accepted records counts `0` for every accepted record
/// even when more rows carry coordinates. Flagged records get `None`.
///
/// `records` and `proximity.records` must be aligned row for row.
pub fn count_adjacent(records: &[BusinessRecord], proximity: &ProximityOutcome) -> AdjacencyOutcome {
    let radius = proximity.mean_distance().unwrap_or(0.0);
    let participants: Vec<IndexedPoint> = records
        .iter()
        .zip(&proximity.records)
        .filter(|(_, result)| result.avg_nearest_distance.is_some())
        .filter_map(|(record, _)| {
            record.location.map(|location| IndexedPoint {
                id: record.row,
                location,
            })
        })
        .collect();

    let counts_by_row: Vec<usize> = if participants.len() < 2 {
        vec![0; participants.len()]
    } else {
        let tree = KdTree::build(participants.clone());
        participants
            .par_iter()
            .map(|point| tree.count_within(&point.location, radius, Some(point.id)))
            .collect()
    };

    let mut found = participants.iter().zip(counts_by_row).peekable();
    let counts = proximity
        .records
        .iter()
        .map(|result| {
            found
                .next_if(|(point, _)| point.id == result.row)
                .map(|(_, count)| count)
        })
        .collect();

    AdjacencyOutcome { radius, counts }
}
