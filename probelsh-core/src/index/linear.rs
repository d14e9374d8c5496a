//! Linear-scan index for exact nearest neighbor search.
//!
//! Computes the distance to every key on each query. It is O(n) per query,
//! but it provides:
//! - 100% recall (exact results)
//! - Ground truth for calibrating and evaluating [`MultiProbeLsh`](crate::MultiProbeLsh)

use crate::distance::{DistanceMetric, Metric};
use crate::error::{Error, Result};
use crate::index::GroundTruth;
use crate::neighbor::Neighbor;

/// Exact searcher over keys held in insertion order.
///
/// Built over the same keys in the same order as an LSH index, its result
/// indices line up with the LSH index's entry indices.
///
/// # Example
///
/// ```
/// use probelsh_core::{DistanceMetric, GroundTruth, LinearSearch};
///
/// let keys = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0]];
/// let search = LinearSearch::of(keys, DistanceMetric::Euclidean).unwrap();
///
/// let nearest = search.nearest(&[0.9, 0.1]).unwrap();
/// assert_eq!(nearest.index, 1);
///
/// let within = search.range(&[0.0, 0.0], 1.5);
/// assert_eq!(within.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LinearSearch<K, D = DistanceMetric> {
    /// The dimension of keys in this index.
    dimension: usize,
    /// The distance function used for ranking.
    metric: D,
    /// Keys indexed by insertion position.
    keys: Vec<K>,
}

impl<K, D> LinearSearch<K, D>
where
    K: AsRef<[f32]>,
    D: Metric,
{
    /// Creates an empty searcher for keys of the given dimension.
    pub fn new(metric: D, dimension: usize) -> Self {
        Self {
            dimension,
            metric,
            keys: Vec::new(),
        }
    }

    /// Builds a searcher over `keys`, taking the dimension from the first key.
    ///
    /// # Errors
    ///
    /// Returns an error if the keys do not all share one dimension.
    pub fn of(keys: Vec<K>, metric: D) -> Result<Self> {
        let dimension = keys.first().map(|k| k.as_ref().len()).unwrap_or(0);
        let mut search = Self::new(metric, dimension);
        search.keys.reserve(keys.len());
        for key in keys {
            search.insert(key)?;
        }
        Ok(search)
    }

    /// Returns the dimension of keys in this searcher.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the searcher contains no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Appends a key and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the key dimension doesn't match.
    pub fn insert(&mut self, key: K) -> Result<usize> {
        let got = key.as_ref().len();
        if got != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                got,
            });
        }
        self.keys.push(key);
        Ok(self.keys.len() - 1)
    }

    /// Gets a key by index.
    pub fn get(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    /// Scores every key against the query, in index order.
    fn scan<'a>(&'a self, query: &'a [f32]) -> impl Iterator<Item = Neighbor> + 'a {
        self.keys
            .iter()
            .enumerate()
            .map(move |(index, key)| Neighbor::new(index, self.metric.distance(query, key.as_ref())))
    }

    fn accepts(&self, query: &[f32]) -> bool {
        query.len() == self.dimension
    }
}

impl<K, D> GroundTruth for LinearSearch<K, D>
where
    K: AsRef<[f32]>,
    D: Metric,
{
    fn nearest(&self, query: &[f32]) -> Option<Neighbor> {
        if !self.accepts(query) {
            return None;
        }
        self.scan(query).min()
    }

    fn knn(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if !self.accepts(query) || k == 0 {
            return Vec::new();
        }
        let mut candidates: Vec<Neighbor> = self.scan(query).collect();
        candidates.sort();
        candidates.truncate(k);
        candidates
    }

    fn range(&self, query: &[f32], radius: f32) -> Vec<Neighbor> {
        if !self.accepts(query) {
            return Vec::new();
        }
        let mut matches: Vec<Neighbor> =
            self.scan(query).filter(|n| n.distance <= radius).collect();
        matches.sort();
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_search() -> LinearSearch<Vec<f32>> {
        LinearSearch::of(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![1.0, 0.0, 0.0],
            ],
            DistanceMetric::Euclidean,
        )
        .unwrap()
    }

    #[test]
    fn test_new_search() {
        let search: LinearSearch<Vec<f32>> = LinearSearch::new(DistanceMetric::Euclidean, 256);
        assert_eq!(search.dimension(), 256);
        assert!(search.is_empty());
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut search = create_test_search();
        let result = search.insert(vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
        assert_eq!(search.len(), 4);
    }

    #[test]
    fn test_of_rejects_ragged_keys() {
        let result = LinearSearch::of(
            vec![vec![1.0, 0.0], vec![1.0]],
            DistanceMetric::Euclidean,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nearest_prefers_lower_index_on_ties() {
        let search = create_test_search();
        let nearest = search.nearest(&[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(nearest.index, 0);
        assert!(nearest.distance < f32::EPSILON);
    }

    #[test]
    fn test_knn_sorted_and_truncated() {
        let search = create_test_search();
        let results = search.knn(&[0.9, 0.1, 0.0], 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 3);
        assert_eq!(results[2].index, 1);
        assert!(search.knn(&[0.9, 0.1, 0.0], 0).is_empty());
    }

    #[test]
    fn test_range() {
        let search = create_test_search();
        let results = search.range(&[1.0, 0.0, 0.0], 0.5);
        let indices: Vec<_> = results.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 3]);
    }

    #[test]
    fn test_empty_and_mismatched_queries() {
        let empty: LinearSearch<Vec<f32>> = LinearSearch::new(DistanceMetric::Euclidean, 3);
        assert!(empty.nearest(&[1.0, 0.0, 0.0]).is_none());

        let search = create_test_search();
        assert!(search.nearest(&[1.0]).is_none());
        assert!(search.knn(&[1.0], 2).is_empty());
        assert!(search.range(&[1.0], 2.0).is_empty());
    }

    #[test]
    fn test_custom_metric() {
        let manhattan = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        };
        let search = LinearSearch::of(vec![[0.0f32, 0.0], [2.0, 2.0]], manhattan).unwrap();
        let nearest = search.nearest(&[2.0, 1.0]).unwrap();
        assert_eq!(nearest.index, 1);
        assert!((nearest.distance - 1.0).abs() < 1e-6);
    }
}
