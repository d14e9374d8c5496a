//! Multi-probe LSH index.
//!
//! Approximate nearest neighbor search over Euclidean-style vectors with
//! `L` independent hash tables of `M` random projections each. Queries probe
//! several nearby buckets per table (see [`probe`]) instead of just the
//! query's own, which recovers most of the recall lost to quantization
//! without adding tables.
//!
//! # Algorithm Overview
//!
//! - Insert hashes the key into every table and appends its index to one
//!   bucket per table.
//! - A query projects onto each table and walks the tables' probe sequences
//!   round-robin, so every table's most likely buckets are visited before
//!   any table's less likely ones.
//! - Candidates are deduplicated and ranked by their true distance; hashing
//!   only shapes the candidate set, never the ranking.
//! - [`MultiProbeLsh::fit`] picks the probe budget and candidate limit
//!   against an exact searcher (see [`calibrate`]).
//!
//! # References
//!
//! - Datar, Immorlica, Indyk & Mirrokni (2004): "Locality-Sensitive Hashing
//!   Scheme Based on p-Stable Distributions"
//! - Lv, Josephson, Wang, Charikar & Li (2007): "Multi-Probe LSH"

pub mod bucket;
pub mod calibrate;
pub mod hash;
pub mod probe;

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{LshConfig, QueryOptions};
use crate::distance::{DistanceMetric, Metric};
use crate::error::{Error, Result};
use crate::neighbor::Neighbor;

use bucket::HashTable;
use calibrate::Calibration;
use hash::Projection;
use probe::ProbeSequence;

/// How much work one query may do.
#[derive(Debug, Clone, Copy)]
struct ProbePlan {
    /// Buckets probed per table at most.
    probes: usize,
    /// Stop a table once its modeled recall share is covered.
    recall: Option<f64>,
    /// Stop everything once this many distinct candidates are gathered.
    max_candidates: usize,
    /// Stop a table at its first non-empty bucket.
    first_hit: bool,
}

/// Per-table query state.
struct TableCursor {
    table: usize,
    sequence: ProbeSequence,
    covered: f64,
    done: bool,
}

/// Multi-probe LSH index over keys `K` with stored values `V`.
///
/// Keys are any `AsRef<[f32]>` of the configured dimension; values are
/// opaque and returned through [`MultiProbeLsh::get`]. Multiple entries may
/// share identical keys. Entries can be inserted before or after fitting.
///
/// # Example
///
/// ```
/// use probelsh_core::{DistanceMetric, LshConfig, MultiProbeLsh};
///
/// let config = LshConfig::new(2, 8, 2, 4.0).with_seed(7).with_probes(9);
/// let mut index: MultiProbeLsh<Vec<f32>, &str> =
///     MultiProbeLsh::new(config, DistanceMetric::Euclidean).unwrap();
///
/// index.insert(vec![0.0, 0.0], "origin").unwrap();
/// index.insert(vec![0.5, 0.1], "near").unwrap();
/// index.insert(vec![40.0, -40.0], "far").unwrap();
///
/// let nearest = index.nearest(&[0.4, 0.0]).unwrap().unwrap();
/// assert_eq!(index.get(nearest.index).unwrap().1, &"near");
/// ```
pub struct MultiProbeLsh<K, V, D = DistanceMetric> {
    /// Construction parameters.
    config: LshConfig,
    /// Ranks candidates.
    metric: D,
    /// One hash table per `config.tables`.
    tables: Vec<HashTable>,
    /// Keys by insertion index.
    keys: Vec<K>,
    /// Values by insertion index.
    values: Vec<V>,
    /// Result of the last fit, if any.
    calibration: Option<Calibration>,
}

impl<K, V, D> MultiProbeLsh<K, V, D>
where
    K: AsRef<[f32]>,
    D: Metric,
{
    /// Creates an empty index whose projections are drawn from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any parameter is out of range.
    pub fn new(config: LshConfig, metric: D) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, metric, &mut rng)
    }

    /// Creates an empty index drawing projections from the given generator.
    ///
    /// `config.seed` is ignored.
    pub fn with_rng<R: Rng + ?Sized>(config: LshConfig, metric: D, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let tables = (0..config.tables)
            .map(|_| HashTable::new(config.dimension, config.projections, config.width, rng))
            .collect();

        Ok(Self {
            config,
            metric,
            tables,
            keys: Vec::new(),
            values: Vec::new(),
            calibration: None,
        })
    }

    /// Returns the construction parameters.
    #[inline]
    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    /// Returns the dimension of keys in this index.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Returns the distance function.
    #[inline]
    pub fn metric(&self) -> &D {
        &self.metric
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the index contains no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the hash tables.
    #[inline]
    pub fn tables(&self) -> &[HashTable] {
        &self.tables
    }

    /// Returns the active calibration, if the index has been fit.
    #[inline]
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Gets an entry's key and value by insertion index.
    pub fn get(&self, index: usize) -> Option<(&K, &V)> {
        Some((self.keys.get(index)?, self.values.get(index)?))
    }

    /// Projects a vector onto the hash functions of one table.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatch or an out-of-range table.
    pub fn project(&self, table: usize, vector: &[f32]) -> Result<Projection> {
        self.check_dimension(vector)?;
        let table = self.tables.get(table).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "table {} out of range, index has {}",
                table,
                self.tables.len()
            ))
        })?;
        Ok(table.project(vector))
    }

    /// Inserts an entry and returns its index.
    ///
    /// The entry is placed in exactly one bucket of every table.
    ///
    /// # Errors
    ///
    /// Returns an error if the key dimension doesn't match the index.
    pub fn insert(&mut self, key: K, value: V) -> Result<usize> {
        self.check_dimension(key.as_ref())?;

        let index = self.keys.len();
        for table in &mut self.tables {
            table.insert(key.as_ref(), index);
        }
        self.keys.push(key);
        self.values.push(value);

        Ok(index)
    }

    /// Finds the approximate nearest neighbor with the index's default budget.
    ///
    /// Returns `Ok(None)` when no table yields a candidate within budget.
    pub fn nearest(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.nearest_with(query, &QueryOptions::default())
    }

    /// Finds the approximate nearest neighbor.
    ///
    /// Without an explicit probe budget each table is probed until its first
    /// non-empty bucket or until the default budget runs out. With
    /// `options.probes` set, every table walks its whole sequence up to that
    /// budget, so the answer equals the best of [`MultiProbeLsh::knn_with`]
    /// under the same options. The closest of all retrieved entries wins.
    pub fn nearest_with(&self, query: &[f32], options: &QueryOptions) -> Result<Option<Neighbor>> {
        self.check_query(query, options)?;
        let plan = self.plan(options, options.probes.is_none());
        let candidates = self.gather(query, &plan);
        Ok(self.score(query, &candidates).into_iter().min())
    }

    /// Finds up to `k` approximate nearest neighbors, sorted by distance.
    ///
    /// Probing stops once `max_candidates` distinct entries have been
    /// gathered, or once every table has covered its share of
    /// `recall_target` under the fitted collision model.
    pub fn knn(
        &self,
        query: &[f32],
        k: usize,
        recall_target: f64,
        max_candidates: usize,
    ) -> Result<Vec<Neighbor>> {
        let options = QueryOptions::new()
            .with_recall(recall_target)
            .with_max_candidates(max_candidates);
        self.knn_with(query, k, &options)
    }

    /// Finds up to `k` approximate nearest neighbors with explicit options.
    pub fn knn_with(&self, query: &[f32], k: usize, options: &QueryOptions) -> Result<Vec<Neighbor>> {
        self.check_query(query, options)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let plan = self.plan(options, false);
        let candidates = self.gather(query, &plan);
        let mut neighbors = self.score(query, &candidates);
        neighbors.sort();
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Finds entries within `radius` of the query, sorted by distance.
    pub fn range(
        &self,
        query: &[f32],
        radius: f32,
        recall_target: f64,
        max_candidates: usize,
    ) -> Result<Vec<Neighbor>> {
        let options = QueryOptions::new()
            .with_recall(recall_target)
            .with_max_candidates(max_candidates);
        self.range_with(query, radius, &options)
    }

    /// Finds entries within `radius` of the query with explicit options.
    pub fn range_with(
        &self,
        query: &[f32],
        radius: f32,
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor>> {
        self.check_query(query, options)?;
        if radius.is_nan() {
            return Err(Error::InvalidParameter("radius must not be NaN".into()));
        }

        let plan = self.plan(options, false);
        let candidates = self.gather(query, &plan);
        let mut neighbors: Vec<Neighbor> = self
            .score(query, &candidates)
            .into_iter()
            .filter(|n| n.distance <= radius)
            .collect();
        neighbors.sort();
        Ok(neighbors)
    }

    /// Finds up to `k` neighbors with the index's default probe budget and
    /// candidate limit, without a recall target.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.knn_with(query, k, &QueryOptions::default())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }
        Ok(())
    }

    fn check_query(&self, query: &[f32], options: &QueryOptions) -> Result<()> {
        self.check_dimension(query)?;
        options.validate()
    }

    /// Resolves options against the calibration and the config defaults.
    fn plan(&self, options: &QueryOptions, first_hit: bool) -> ProbePlan {
        let calibration = self.calibration.as_ref();
        ProbePlan {
            probes: options
                .probes
                .or_else(|| calibration.map(Calibration::probes))
                .unwrap_or(self.config.probes),
            recall: options.recall,
            max_candidates: options
                .max_candidates
                .or_else(|| calibration.map(Calibration::max_candidates))
                .unwrap_or(usize::MAX),
            first_hit,
        }
    }

    /// Collects distinct candidate indices in deterministic probe order.
    fn gather(&self, query: &[f32], plan: &ProbePlan) -> Vec<usize> {
        // Per-table share such that 1 - (1 - share)^L reaches the target.
        let table_target = plan
            .recall
            .map(|recall| 1.0 - (1.0 - recall).powf(1.0 / self.tables.len() as f64));

        let mut cursors: Vec<TableCursor> = self
            .tables
            .iter()
            .enumerate()
            .map(|(table, t)| TableCursor {
                table,
                sequence: ProbeSequence::new(t.project(query), plan.probes),
                covered: 0.0,
                done: false,
            })
            .collect();

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        'probing: loop {
            let mut active = false;

            for cursor in cursors.iter_mut().filter(|c| !c.done) {
                let Some(probe) = cursor.sequence.next() else {
                    cursor.done = true;
                    continue;
                };
                active = true;

                let bucket = self.tables[cursor.table].lookup(&probe.key);
                for &entry in bucket {
                    if seen.insert(entry) {
                        candidates.push(entry);
                        if candidates.len() >= plan.max_candidates {
                            break 'probing;
                        }
                    }
                }

                if plan.first_hit && !bucket.is_empty() {
                    cursor.done = true;
                }

                if let (Some(target), Some(model)) = (table_target, self.model(cursor.table)) {
                    cursor.covered += model.probability(cursor.sequence.projection(), &probe);
                    if cursor.covered >= target {
                        cursor.done = true;
                    }
                }
            }

            if !active {
                break;
            }
        }

        tracing::trace!(candidates = candidates.len(), "gathered candidates");
        candidates
    }

    fn model(&self, table: usize) -> Option<probe::CollisionModel> {
        self.calibration.as_ref().and_then(|c| c.model(table))
    }

    /// Computes true distances for the given candidates.
    fn score(&self, query: &[f32], candidates: &[usize]) -> Vec<Neighbor> {
        candidates
            .iter()
            .map(|&index| {
                Neighbor::new(index, self.metric.distance(query, self.keys[index].as_ref()))
            })
            .collect()
    }
}
