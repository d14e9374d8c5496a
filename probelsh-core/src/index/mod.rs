//! Search structures.
//!
//! - [`LinearSearch`](linear::LinearSearch): exact scan, used as ground truth
//! - [`MultiProbeLsh`](mplsh::MultiProbeLsh): approximate search with multi-probe LSH

pub mod linear;
pub mod mplsh;

use crate::neighbor::Neighbor;

/// Exact search answers used to calibrate and evaluate an approximate index.
///
/// Result indices must refer to the same entries as the index being
/// calibrated, i.e. the oracle must be built over the same keys in the same
/// insertion order. Implementations never see mutation from the LSH index.
pub trait GroundTruth {
    /// The closest key, or `None` if there are no keys.
    fn nearest(&self, query: &[f32]) -> Option<Neighbor>;

    /// Up to `k` closest keys, sorted by ascending distance.
    fn knn(&self, query: &[f32], k: usize) -> Vec<Neighbor>;

    /// All keys within `radius` of the query, sorted by ascending distance.
    fn range(&self, query: &[f32], radius: f32) -> Vec<Neighbor>;
}
