//! Month-by-month active sets with spatial indices shared between months.
//!
//! A single sweep over the sorted open/close events of every subject yields,
//! for each month start between the earliest and latest checkpoint, the set
//! of subjects whose interval covers that date. A new index is built only
//! when at least one event fired since the previous month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;

use prox_core::date::{month_start, months_between, next_month_start};
use prox_core::Location;

use crate::interval::OperatingInterval;
use crate::kdtree::{IndexedPoint, KdTree};

/// A record eligible for distance computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subject {
    /// Row index in the source table.
    pub id: usize,
    /// Operating interval.
    pub interval: OperatingInterval,
    /// Valid planar location.
    pub location: Location,
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Open(usize, Location),
    Close(usize),
}

/// Spatial indices of the active set at every month start of a table.
#[derive(Debug, Default)]
pub struct Timeline {
    base: Option<NaiveDate>,
    epoch_of_month: Vec<usize>,
    indices: Vec<KdTree>,
}

impl Timeline {
    /// Sweeps the subjects' intervals and builds one index per distinct active set.
    pub fn build(subjects: &[Subject]) -> Self {
        let Some(first) = subjects
            .iter()
            .map(|subject| month_start(subject.interval.start()))
            .min()
        else {
            return Self::default();
        };
        let last = subjects
            .iter()
            .map(|subject| month_start(subject.interval.end()))
            .max()
            .unwrap_or(first);

        let mut events = Vec::with_capacity(subjects.len() * 2);
        for subject in subjects {
            events.push((
                subject.interval.start(),
                Event::Open(subject.id, subject.location),
            ));
            // Covered through `end` inclusive, so the subject leaves the day after.
            if let Some(after) = subject.interval.end().succ_opt() {
                events.push((after, Event::Close(subject.id)));
            }
        }
        events.sort_by_key(|(date, _)| *date);

        let mut active = BTreeMap::new();
        let mut cursor = 0;
        let mut snapshots: Vec<Vec<IndexedPoint>> = Vec::new();
        let mut epoch_of_month = Vec::new();
        let mut month = Some(first);
        while let Some(current) = month.filter(|date| *date <= last) {
            let mut changed = snapshots.is_empty();
            while cursor < events.len() && events[cursor].0 <= current {
                match events[cursor].1 {
                    Event::Open(id, location) => {
                        active.insert(id, location);
                    }
                    Event::Close(id) => {
                        active.remove(&id);
                    }
                }
                changed = true;
                cursor += 1;
            }
            if changed {
                snapshots.push(
                    active
                        .iter()
                        .map(|(&id, &location)| IndexedPoint { id, location })
                        .collect(),
                );
            }
            epoch_of_month.push(snapshots.len() - 1);
            month = next_month_start(current);
        }

        let indices = snapshots.into_par_iter().map(KdTree::build).collect();
        Self {
            base: Some(first),
            epoch_of_month,
            indices,
        }
    }

    /// Index over the records active on the month start `checkpoint`.
    pub fn index_at(&self, checkpoint: NaiveDate) -> Option<&KdTree> {
        let base = self.base?;
        let offset = usize::try_from(months_between(base, checkpoint)).ok()?;
        let epoch = *self.epoch_of_month.get(offset)?;
        self.indices.get(epoch)
    }

    /// Number of spatial indices built for the table.
    pub fn index_builds(&self) -> usize {
        self.indices.len()
    }

    /// Number of month starts covered by the sweep.
    pub fn months(&self) -> usize {
        self.epoch_of_month.len()
    }
}
