use prox_core::{
    extract_records, ColumnSchema, ProxError, Table, ADJACENT_COUNT, AVG_NEAREST_DISTANCE,
    OPERATING_PERIOD, PROXIMITY_FLAG,
};
use prox_engine::{count_adjacent, ProximityEngine};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::metrics::TableMetrics;

/// Runs the proximity engine and the adjacency counter over one table and
/// writes the derived columns in place.
///
/// Returns `Ok(None)` when `cancel` fired between the two phases; the table
/// is left untouched in that case. A missing required column surfaces as a
/// `Schema` error.
pub fn enrich_table(
    table: &mut Table,
    schema: &ColumnSchema,
    engine: &ProximityEngine,
    cancel: &CancelToken,
) -> Result<Option<TableMetrics>, ProxError> {
    let records = extract_records(table, schema)?;
    let proximity = engine.run(&records);
    debug!(
        rows = records.len(),
        index_builds = proximity.index_builds,
        "proximity phase done"
    );
    if cancel.is_cancelled() {
        return Ok(None);
    }
    let adjacency = count_adjacent(&records, &proximity);

    let mut periods = Vec::with_capacity(records.len());
    let mut distances = Vec::with_capacity(records.len());
    let mut counts = Vec::with_capacity(records.len());
    let mut flags = Vec::with_capacity(records.len());
    for (result, count) in proximity.records.iter().zip(&adjacency.counts) {
        periods.push(
            result
                .interval
                .map(|interval| interval.period_string())
                .unwrap_or_default(),
        );
        distances.push(
            result
                .avg_nearest_distance
                .map(|distance| distance.to_string())
                .unwrap_or_default(),
        );
        counts.push(count.map(|count| count.to_string()).unwrap_or_default());
        flags.push(result.flag.map(|flag| flag.as_str().to_string()).unwrap_or_default());
    }
    table.set_column(OPERATING_PERIOD, periods)?;
    table.set_column(AVG_NEAREST_DISTANCE, distances)?;
    table.set_column(ADJACENT_COUNT, counts)?;
    table.set_column(PROXIMITY_FLAG, flags)?;

    Ok(Some(TableMetrics::from_outcomes(
        &proximity,
        &adjacency,
        table.truncated_rows.len(),
    )))
}
