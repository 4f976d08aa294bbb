#![deny(missing_docs)]
//! Temporal nearest-neighbour engine for business survival datasets.
//!
//! For every record of an industry table the engine rebuilds the operating
//! interval, samples it at each month start and measures the distance to the
//! nearest competitor operating on that date. The adjacency counter then
//! counts competitors within the table-wide mean of those distances.

/// Adjacency counting over the engine output.
pub mod adjacency;
/// Operating interval reconstruction and checkpoints.
pub mod interval;
/// Static 2-D KD-tree.
pub mod kdtree;
/// Proximity engine.
pub mod proximity;
/// Active-set sweep with shared spatial indices.
pub mod timeline;

pub use adjacency::{count_adjacent, AdjacencyOutcome};
pub use interval::{Checkpoints, ClosureSource, OperatingInterval, Reconstruction};
pub use kdtree::{IndexedPoint, KdTree, Neighbor};
pub use proximity::{ProximityEngine, ProximityOutcome, RecordFlag, RecordProximity};
pub use timeline::{Subject, Timeline};
