//! Thread-safe wrapper around [`MultiProbeLsh`].
//!
//! Queries take a read lock and run concurrently; inserts and fits take the
//! write lock. A query therefore sees either the whole of a fit's result or
//! none of it.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::config::{FitConfig, QueryOptions};
use crate::distance::Metric;
use crate::error::Result;
use crate::index::mplsh::calibrate::Calibration;
use crate::index::mplsh::MultiProbeLsh;
use crate::index::GroundTruth;
use crate::neighbor::Neighbor;

/// An index that can be shared between threads.
///
/// ```
/// use std::sync::Arc;
/// use probelsh_core::{DistanceMetric, LshConfig, MultiProbeLsh, SharedIndex};
///
/// let index: MultiProbeLsh<Vec<f32>, u32> =
///     MultiProbeLsh::new(LshConfig::new(2, 4, 2, 2.0), DistanceMetric::Euclidean).unwrap();
/// let shared = Arc::new(SharedIndex::new(index));
///
/// shared.insert(vec![1.0, 1.0], 7).unwrap();
/// let reader = Arc::clone(&shared);
/// let found = std::thread::spawn(move || reader.nearest(&[1.0, 1.0]).unwrap())
///     .join()
///     .unwrap();
/// assert_eq!(found.unwrap().index, 0);
/// ```
pub struct SharedIndex<K, V, D> {
    inner: RwLock<MultiProbeLsh<K, V, D>>,
}

impl<K, V, D> SharedIndex<K, V, D>
where
    K: AsRef<[f32]>,
    D: Metric,
{
    /// Wraps an index.
    pub fn new(index: MultiProbeLsh<K, V, D>) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    /// Inserts an entry under the write lock.
    pub fn insert(&self, key: K, value: V) -> Result<usize> {
        self.inner.write().insert(key, value)
    }

    /// Fits under the write lock and returns a copy of the new calibration.
    pub fn fit<G, Q>(&self, oracle: &G, sample: &[Q], config: &FitConfig) -> Result<Calibration>
    where
        G: GroundTruth + ?Sized,
        Q: AsRef<[f32]>,
    {
        let mut index = self.inner.write();
        index.fit(oracle, sample, config).cloned()
    }

    /// Nearest neighbor with the default budget, under the read lock.
    pub fn nearest(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.inner.read().nearest(query)
    }

    /// Nearest neighbor with explicit options, under the read lock.
    pub fn nearest_with(&self, query: &[f32], options: &QueryOptions) -> Result<Option<Neighbor>> {
        self.inner.read().nearest_with(query, options)
    }

    /// Up to `k` neighbors for a recall target, under the read lock.
    pub fn knn(
        &self,
        query: &[f32],
        k: usize,
        recall_target: f64,
        max_candidates: usize,
    ) -> Result<Vec<Neighbor>> {
        self.inner.read().knn(query, k, recall_target, max_candidates)
    }

    /// Up to `k` neighbors with explicit options, under the read lock.
    pub fn knn_with(&self, query: &[f32], k: usize, options: &QueryOptions) -> Result<Vec<Neighbor>> {
        self.inner.read().knn_with(query, k, options)
    }

    /// Entries within `radius` for a recall target, under the read lock.
    pub fn range(
        &self,
        query: &[f32],
        radius: f32,
        recall_target: f64,
        max_candidates: usize,
    ) -> Result<Vec<Neighbor>> {
        self.inner
            .read()
            .range(query, radius, recall_target, max_candidates)
    }

    /// Entries within `radius` with explicit options, under the read lock.
    pub fn range_with(
        &self,
        query: &[f32],
        radius: f32,
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor>> {
        self.inner.read().range_with(query, radius, options)
    }

    /// Up to `k` neighbors with the default budget, under the read lock.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.inner.read().search(query, k)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Read access to the underlying index, e.g. for [`MultiProbeLsh::get`].
    ///
    /// Writers block while the guard is held.
    pub fn read(&self) -> RwLockReadGuard<'_, MultiProbeLsh<K, V, D>> {
        self.inner.read()
    }

    /// Unwraps the index.
    pub fn into_inner(self) -> MultiProbeLsh<K, V, D> {
        self.inner.into_inner()
    }
}
