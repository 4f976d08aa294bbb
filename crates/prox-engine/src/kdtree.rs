//! Static two-dimensional KD-tree over planar business locations.
//!
//! The tree is stored implicitly: each subslice keeps its median (on the
//! split axis of its depth) at the middle position, with smaller keys to
//! the left and larger keys to the right. Distances are exact Euclidean
//! distances, so query results do not depend on the tree layout.

use prox_core::Location;

/// A location tagged with the row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    /// Row index of the owning record.
    pub id: usize,
    /// Planar coordinate.
    pub location: Location,
}

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index of the neighbour.
    pub id: usize,
    /// Euclidean distance to the query point.
    pub distance: f64,
}

/// Balanced KD-tree built once over a fixed point set.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    points: Vec<IndexedPoint>,
}

fn key(location: &Location, axis: usize) -> f64 {
    if axis == 0 {
        location.x
    } else {
        location.y
    }
}

impl KdTree {
    /// Builds the tree in `O(n log n)`.
    pub fn build(mut points: Vec<IndexedPoint>) -> Self {
        arrange(&mut points, 0);
        Self { points }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the tree indexes no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closest point to `target`, skipping the point whose id equals `exclude`.
    ///
    /// Equal distances resolve to the smaller id.
    pub fn nearest(&self, target: &Location, exclude: Option<usize>) -> Option<Neighbor> {
        let mut best = None;
        nearest_in(&self.points, 0, target, exclude, &mut best);
        best.map(|(distance_squared, id)| Neighbor {
            id,
            distance: distance_squared.sqrt(),
        })
    }

    /// Number of points within `radius` (inclusive) of `target`, skipping `exclude`.
    pub fn count_within(&self, target: &Location, radius: f64, exclude: Option<usize>) -> usize {
        if radius.is_nan() || radius < 0.0 {
            return 0;
        }
        count_in(&self.points, 0, target, radius * radius, exclude)
    }
}

fn arrange(points: &mut [IndexedPoint], depth: usize) {
    if points.len() <= 1 {
        return;
    }
    let axis = depth % 2;
    let mid = points.len() / 2;
    points.select_nth_unstable_by(mid, |a, b| {
        key(&a.location, axis)
            .total_cmp(&key(&b.location, axis))
            .then(a.id.cmp(&b.id))
    });
    let (left, rest) = points.split_at_mut(mid);
    arrange(left, depth + 1);
    arrange(&mut rest[1..], depth + 1);
}

fn split<'a>(
    points: &'a [IndexedPoint],
    depth: usize,
    target: &Location,
) -> (&'a IndexedPoint, f64, &'a [IndexedPoint], &'a [IndexedPoint]) {
    let mid = points.len() / 2;
    let pivot = &points[mid];
    let axis = depth % 2;
    let diff = key(target, axis) - key(&pivot.location, axis);
    let (near, far) = if diff < 0.0 {
        (&points[..mid], &points[mid + 1..])
    } else {
        (&points[mid + 1..], &points[..mid])
    };
    (pivot, diff, near, far)
}

fn nearest_in(
    points: &[IndexedPoint],
    depth: usize,
    target: &Location,
    exclude: Option<usize>,
    best: &mut Option<(f64, usize)>,
) {
    if points.is_empty() {
        return;
    }
    let (pivot, diff, near, far) = split(points, depth, target);
    if exclude != Some(pivot.id) {
        let candidate = (pivot.location.distance_squared(target), pivot.id);
        let better = match *best {
            None => true,
            Some((distance, id)) => {
                candidate.0 < distance || (candidate.0 == distance && candidate.1 < id)
            }
        };
        if better {
            *best = Some(candidate);
        }
    }
    nearest_in(near, depth + 1, target, exclude, best);
    if best.map_or(true, |(distance, _)| diff * diff <= distance) {
        nearest_in(far, depth + 1, target, exclude, best);
    }
}

fn count_in(
    points: &[IndexedPoint],
    depth: usize,
    target: &Location,
    radius_squared: f64,
    exclude: Option<usize>,
) -> usize {
    if points.is_empty() {
        return 0;
    }
    let (pivot, diff, near, far) = split(points, depth, target);
    let mut count = usize::from(
        exclude != Some(pivot.id) && pivot.location.distance_squared(target) <= radius_squared,
    );
    count += count_in(near, depth + 1, target, radius_squared, exclude);
    if diff * diff <= radius_squared {
        count += count_in(far, depth + 1, target, radius_squared, exclude);
    }
    count
}
