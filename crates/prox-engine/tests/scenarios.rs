use chrono::NaiveDate;
use prox_core::{BusinessRecord, Location};
use prox_engine::{count_adjacent, OperatingInterval, ProximityEngine, RecordFlag};

fn horizon() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
}

fn record(row: usize, id: &str, permit: &str, closure: &str, at: Option<(f64, f64)>) -> BusinessRecord {
    BusinessRecord {
        row,
        id: id.to_string(),
        permit_date: permit.to_string(),
        closure_date: closure.to_string(),
        location: at.map(|(x, y)| Location::new(x, y)),
        survival_label: None,
    }
}

#[test]
fn three_open_businesses_on_a_line() {
    let records = vec![
        record(0, "a", "2016-01-01", "", Some((0.0, 0.0))),
        record(1, "b", "2016-01-01", "", Some((10.0, 0.0))),
        record(2, "c", "2016-01-01", "", Some((1000.0, 0.0))),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    let distances: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.avg_nearest_distance.unwrap())
        .collect();
    assert_eq!(distances, vec![10.0, 10.0, 990.0]);
    assert_eq!(outcome.records[0].checkpoints, 48);
    assert_eq!(outcome.records[0].samples, 48);
    assert_eq!(outcome.index_builds, 1);
    assert_eq!(
        outcome.records[2].interval.unwrap().period_string(),
        "2016-01-01~2019-12-31"
    );

    let adjacency = count_adjacent(&records, &outcome);
    assert!((adjacency.radius - 1010.0 / 3.0).abs() < 1e-9);
    assert_eq!(adjacency.counts, vec![Some(1), Some(1), Some(0)]);
}

#[test]
fn short_interval_samples_three_month_starts() {
    let interval = OperatingInterval::reconstruct("2016-06-01", "2016-08-15", horizon())
        .unwrap()
        .interval;
    let checkpoints: Vec<_> = interval.checkpoints().map(|d| d.to_string()).collect();
    assert_eq!(checkpoints, vec!["2016-06-01", "2016-07-01", "2016-08-01"]);
}

#[test]
fn competitors_without_coordinates_yield_zero() {
    let records = vec![
        record(0, "a", "2016-01-01", "", Some((0.0, 0.0))),
        record(1, "b", "2016-01-01", "", None),
        record(2, "c", "2016-02-01", "2017-01-01", None),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    assert_eq!(outcome.records[0].avg_nearest_distance, Some(0.0));
    assert_eq!(outcome.records[0].samples, 0);
    assert_eq!(outcome.records[1].flag, Some(RecordFlag::InvalidCoordinate));
    assert_eq!(outcome.records[1].avg_nearest_distance, None);
    assert!(outcome.records[1].interval.is_some());
    assert_eq!(outcome.flagged(RecordFlag::InvalidCoordinate), 2);

    let adjacency = count_adjacent(&records, &outcome);
    assert_eq!(adjacency.counts, vec![Some(0), None, None]);
}

#[test]
fn malformed_permit_date_only_affects_its_row() {
    let mut records: Vec<_> = (0..100)
        .map(|row| {
            record(
                row,
                &format!("shop-{row}"),
                "2016-03-02",
                "",
                Some((row as f64 * 5.0, 0.0)),
            )
        })
        .collect();
    records[42].permit_date = "2016-13-45".to_string();

    let outcome = ProximityEngine::new(horizon()).run(&records);
    assert_eq!(outcome.records[42].flag, Some(RecordFlag::MalformedPermitDate));
    assert_eq!(outcome.records[42].interval, None);
    assert_eq!(outcome.accepted().count(), 99);
    assert_eq!(outcome.records[41].avg_nearest_distance, Some(5.0));
    assert_eq!(outcome.records[43].avg_nearest_distance, Some(5.0));
    assert_eq!(outcome.records[0].avg_nearest_distance, Some(5.0));
    // Permit on the 2nd: the March checkpoint precedes every opening.
    assert_eq!(outcome.records[0].checkpoints, 46);
    assert_eq!(outcome.records[0].samples, 45);

    let adjacency = count_adjacent(&records, &outcome);
    assert_eq!(adjacency.counts[42], None);
    assert_eq!(adjacency.counts.iter().flatten().count(), 99);
}

#[test]
fn inverted_interval_is_flagged_not_sampled() {
    let records = vec![
        record(0, "a", "2017-05-01", "2016-01-01", Some((0.0, 0.0))),
        record(1, "b", "2016-01-01", "", Some((3.0, 4.0))),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    assert_eq!(outcome.records[0].flag, Some(RecordFlag::InvertedInterval));
    assert_eq!(outcome.records[0].interval, None);
    assert_eq!(outcome.records[1].avg_nearest_distance, Some(0.0));
}

#[test]
fn shared_names_are_still_competitors() {
    let records = vec![
        record(0, "franchise", "2016-01-01", "", Some((0.0, 0.0))),
        record(1, "franchise", "2016-01-01", "", Some((0.0, 7.0))),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    assert_eq!(outcome.records[0].avg_nearest_distance, Some(7.0));
    assert_eq!(outcome.records[1].avg_nearest_distance, Some(7.0));
}

#[test]
fn competitor_counts_only_while_operating() {
    // b operates for January and February only; a is open for four months.
    let records = vec![
        record(0, "a", "2016-01-01", "2016-04-30", Some((0.0, 0.0))),
        record(1, "b", "2016-01-01", "2016-02-15", Some((4.0, 0.0))),
        record(2, "c", "2016-01-01", "2016-04-30", Some((8.0, 0.0))),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    // Jan, Feb: 4; Mar, Apr: 8.
    assert_eq!(outcome.records[0].avg_nearest_distance, Some(6.0));
    assert_eq!(outcome.records[1].avg_nearest_distance, Some(4.0));
    assert_eq!(outcome.index_builds, 2);
}

#[test]
fn lone_record_has_no_adjacent_competitors() {
    let records = vec![record(0, "a", "2016-01-01", "", Some((0.0, 0.0)))];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    let adjacency = count_adjacent(&records, &outcome);
    assert_eq!(adjacency.radius, 0.0);
    assert_eq!(adjacency.counts, vec![Some(0)]);
}

#[test]
fn flagged_record_with_coordinate_is_not_an_adjacent_competitor() {
    // b sits on top of a but its permit date cannot be parsed.
    let records = vec![
        record(0, "a", "2016-01-01", "", Some((0.0, 0.0))),
        record(1, "b", "not a date", "", Some((0.0, 0.0))),
    ];
    let outcome = ProximityEngine::new(horizon()).run(&records);
    assert_eq!(outcome.records[1].flag, Some(RecordFlag::MalformedPermitDate));
    assert_eq!(outcome.accepted().count(), 1);

    let adjacency = count_adjacent(&records, &outcome);
    assert_eq!(adjacency.counts, vec![Some(0), None]);
}
