//! # probelsh core
//!
//! Multi-probe locality-sensitive hashing for approximate nearest neighbor
//! search over dense `f32` vectors.
//!
//! Keys are hashed into `L` tables of `M` p-stable random projections. A
//! query probes a small, likelihood-ordered set of buckets per table, then
//! ranks the retrieved candidates by their exact distance. [`MultiProbeLsh::fit`]
//! tunes how many buckets to probe against an exact searcher.
//!
//! ## Core Types
//!
//! ### Indexes
//!
//! - [`MultiProbeLsh`] - Approximate search via multi-probe LSH
//! - [`LinearSearch`] - Exact search by full scan, used as ground truth
//! - [`SharedIndex`] - `RwLock`-guarded index for concurrent readers
//!
//! ### Probing
//!
//! - [`ProbeSequence`] - Lazily generated buckets in ascending cost
//! - [`CollisionModel`] - Fitted per-table model of neighbor drift
//! - [`Calibration`] - Probe budget and candidate limit chosen by a fit
//!
//! ### Types
//!
//! - [`Neighbor`] - Entry index and distance, ordered by distance
//! - [`LshConfig`], [`QueryOptions`], [`FitConfig`] - Parameters
//! - [`DistanceMetric`] - Built-in distance functions; any [`Metric`] works

pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod neighbor;
pub mod shared;

// Re-exports for convenient access
pub use config::{FitConfig, LshConfig, QueryOptions};
pub use distance::{DistanceMetric, Metric};
pub use error::{Error, Result};
pub use index::linear::LinearSearch;
pub use index::mplsh::calibrate::{evaluate_nearest, Calibration, NearestReport};
pub use index::mplsh::hash::Projection;
pub use index::mplsh::probe::{CollisionModel, Probe, ProbeSequence};
pub use index::mplsh::MultiProbeLsh;
pub use index::GroundTruth;
pub use neighbor::Neighbor;
pub use shared::SharedIndex;

/// Re-export commonly used types for convenience.
///
/// # Example
///
/// ```rust
/// use probelsh_core::prelude::*;
///
/// let mut index: MultiProbeLsh<Vec<f32>, u64> =
///     MultiProbeLsh::new(LshConfig::new(3, 4, 2, 2.0), DistanceMetric::Euclidean).unwrap();
/// index.insert(vec![1.0, 2.0, 3.0], 1).unwrap();
/// ```
pub mod prelude {
    pub use crate::{
        DistanceMetric, Error, FitConfig, GroundTruth, LinearSearch, LshConfig, Metric,
        MultiProbeLsh, Neighbor, QueryOptions, Result, SharedIndex,
    };
}
