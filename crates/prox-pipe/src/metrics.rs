use std::collections::BTreeMap;

use prox_engine::{AdjacencyOutcome, ClosureSource, ProximityOutcome};
use serde::{Deserialize, Serialize};

/// Per-table counters recorded in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableMetrics {
    /// Data rows in the table.
    pub rows: usize,
    /// Rows that took part in the distance computation.
    pub accepted: usize,
    /// Excluded rows keyed by flag name.
    pub flagged: BTreeMap<String, usize>,
    /// Rows whose unparseable closure date fell back to the horizon.
    pub closure_defaulted: usize,
    /// Rows whose input line had more fields than the header and was truncated.
    pub malformed_lines: usize,
    /// Spatial indices built while sweeping the table.
    pub index_builds: usize,
    /// Adjacency radius; absent when no row was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Mean of the accepted rows' average nearest distances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_distance: Option<f64>,
}

impl TableMetrics {
    /// Collects the counters of one enriched table.
    pub fn from_outcomes(
        proximity: &ProximityOutcome,
        adjacency: &AdjacencyOutcome,
        malformed_lines: usize,
    ) -> Self {
        let mut flagged = BTreeMap::new();
        for flag in proximity.records.iter().filter_map(|record| record.flag) {
            *flagged.entry(flag.as_str().to_string()).or_insert(0) += 1;
        }
        let accepted = proximity.accepted().count();
        let mean_distance = proximity.mean_distance();
        Self {
            rows: proximity.records.len(),
            accepted,
            flagged,
            closure_defaulted: proximity
                .records
                .iter()
                .filter(|record| record.closure == Some(ClosureSource::Defaulted))
                .count(),
            malformed_lines,
            index_builds: proximity.index_builds,
            radius: mean_distance.map(|_| adjacency.radius),
            mean_distance,
        }
    }

    /// Total number of flagged rows.
    pub fn flagged_total(&self) -> usize {
        self.flagged.values().sum()
    }
}
