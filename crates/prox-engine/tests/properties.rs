use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use prox_core::{BusinessRecord, Location};
use prox_engine::{count_adjacent, OperatingInterval, ProximityEngine, ProximityOutcome};

fn horizon() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
}

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

#[derive(Debug, Clone)]
struct Draft {
    permit_offset: u64,
    duration: Option<u64>,
    at: Option<(i32, i32)>,
}

fn draft() -> impl Strategy<Value = Draft> {
    (
        0u64..1500,
        prop::option::weighted(0.6, 0u64..900),
        prop::option::weighted(0.9, (-60i32..60, -60i32..60)),
    )
        .prop_map(|(permit_offset, duration, at)| Draft {
            permit_offset,
            duration,
            at,
        })
}

fn materialize(drafts: &[Draft]) -> Vec<BusinessRecord> {
    drafts
        .iter()
        .enumerate()
        .map(|(row, draft)| {
            let permit = origin() + Days::new(draft.permit_offset);
            let closure = draft
                .duration
                .map(|days| (permit + Days::new(days)).to_string())
                .unwrap_or_default();
            BusinessRecord {
                row,
                id: format!("shop-{}", row % 4),
                permit_date: permit.to_string(),
                closure_date: closure,
                location: draft
                    .at
                    .map(|(x, y)| Location::new(f64::from(x) * 7.5, f64::from(y) * 3.25)),
                survival_label: None,
            }
        })
        .collect()
}

/// Direct evaluation: rescan every other record at every checkpoint.
fn reference(records: &[BusinessRecord]) -> Vec<Option<f64>> {
    let accepted: Vec<(usize, OperatingInterval, Location)> = records
        .iter()
        .filter_map(|record| {
            let interval = OperatingInterval::reconstruct(
                &record.permit_date,
                &record.closure_date,
                horizon(),
            )
            .ok()?
            .interval;
            Some((record.row, interval, record.location?))
        })
        .collect();

    records
        .iter()
        .map(|record| {
            let (row, interval, location) = accepted.iter().find(|(row, ..)| *row == record.row)?;
            let mut sum = 0.0;
            let mut samples = 0usize;
            for checkpoint in interval.checkpoints() {
                let nearest = accepted
                    .iter()
                    .filter(|(other, span, _)| other != row && span.covers(checkpoint))
                    .map(|(_, _, at)| at.distance(location))
                    .min_by(f64::total_cmp);
                if let Some(distance) = nearest {
                    sum += distance;
                    samples += 1;
                }
            }
            Some(if samples == 0 { 0.0 } else { sum / samples as f64 })
        })
        .collect()
}

fn distances(outcome: &ProximityOutcome) -> Vec<Option<f64>> {
    outcome
        .records
        .iter()
        .map(|record| record.avg_nearest_distance)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn shared_indices_match_direct_rescan(drafts in prop::collection::vec(draft(), 0..24)) {
        let records = materialize(&drafts);
        let outcome = ProximityEngine::new(horizon()).run(&records);
        prop_assert_eq!(distances(&outcome), reference(&records));
    }

    #[test]
    fn distances_are_finite_and_non_negative(drafts in prop::collection::vec(draft(), 1..24)) {
        let records = materialize(&drafts);
        let outcome = ProximityEngine::new(horizon()).run(&records);
        for record in outcome.accepted() {
            let distance = record.avg_nearest_distance.expect("accepted record has a distance");
            prop_assert!(distance.is_finite());
            prop_assert!(distance >= 0.0);
            prop_assert!(record.samples <= record.checkpoints);
            let interval = record.interval.expect("accepted record has an interval");
            prop_assert!(interval.end() >= interval.start());
        }
    }

    #[test]
    fn rerun_is_identical(drafts in prop::collection::vec(draft(), 0..24)) {
        let records = materialize(&drafts);
        let engine = ProximityEngine::new(horizon());
        let first = engine.run(&records);
        let second = engine.run(&records);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(count_adjacent(&records, &engine.run(&records)), count_adjacent(&records, &second));
    }

    #[test]
    fn adjacency_never_counts_self(drafts in prop::collection::vec(draft(), 0..24)) {
        let records = materialize(&drafts);
        let outcome = ProximityEngine::new(horizon()).run(&records);
        let adjacency = count_adjacent(&records, &outcome);
        let participants = adjacency.counts.iter().flatten().count();
        for (record, count) in records.iter().zip(&adjacency.counts) {
            let Some(count) = count else { continue };
            prop_assert!(*count < participants.max(1));
            let location = record.location.expect("participant has a location");
            let expected = records
                .iter()
                .zip(&adjacency.counts)
                .filter(|(other, counted)| other.row != record.row && counted.is_some())
                .filter_map(|(other, _)| other.location)
                .filter(|at| at.distance_squared(&location) <= adjacency.radius * adjacency.radius)
                .count();
            if participants >= 2 {
                prop_assert_eq!(*count, expected);
            } else {
                prop_assert_eq!(*count, 0);
            }
        }
    }

    #[test]
    fn later_closure_never_loses_checkpoints(
        permit_offset in 0u64..1500,
        duration in 0u64..900,
        extra in 0u64..400,
    ) {
        let permit = origin() + Days::new(permit_offset);
        let short = OperatingInterval::new(permit, permit + Days::new(duration)).unwrap();
        let long = OperatingInterval::new(permit, permit + Days::new(duration + extra)).unwrap();
        prop_assert!(short.checkpoints().count() >= 1);
        prop_assert!(long.checkpoints().count() >= short.checkpoints().count());
    }
}
