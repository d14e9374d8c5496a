//! Fitting probe parameters against exact search.
//!
//! [`MultiProbeLsh::fit`] runs in two passes over a sample of already
//! inserted keys:
//!
//! 1. For every table, estimate how far true neighbors (within `radius`)
//!    drift from a query in projected space. This gives the
//!    [`CollisionModel`] used by recall-targeted queries.
//! 2. Sweep probe budgets 1, 2, 4, ... up to the ceiling and measure
//!    candidate-set recall against the oracle, stopping at the first budget
//!    that reaches the target.
//!
//! An unreachable target is not an error: the ceiling's result is kept and
//! [`Calibration::reached_target`] reports `false`.

use std::collections::HashSet;

use crate::config::FitConfig;
use crate::distance::Metric;
use crate::error::{Error, Result};
use crate::index::GroundTruth;

use super::probe::CollisionModel;
use super::{MultiProbeLsh, ProbePlan};

/// Query parameters chosen by [`MultiProbeLsh::fit`].
///
/// Immutable; a new fit replaces the whole calibration at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    probes: usize,
    max_candidates: usize,
    recall: f64,
    target_recall: f64,
    radius: f32,
    models: Vec<Option<CollisionModel>>,
}

impl Calibration {
    /// Default per-table probe budget.
    #[inline]
    pub fn probes(&self) -> usize {
        self.probes
    }

    /// Default limit on distinct candidates per query.
    #[inline]
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Candidate-set recall measured on the sample at the chosen budget.
    #[inline]
    pub fn recall(&self) -> f64 {
        self.recall
    }

    /// Recall the fit was asked for.
    #[inline]
    pub fn target_recall(&self) -> f64 {
        self.target_recall
    }

    /// Neighborhood radius the fit was run with.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether the measured recall reached the target.
    #[inline]
    pub fn reached_target(&self) -> bool {
        self.recall >= self.target_recall
    }

    /// Collision model of one table; `None` if the sample had no neighbors.
    #[inline]
    pub fn model(&self, table: usize) -> Option<CollisionModel> {
        self.models.get(table).copied().flatten()
    }
}

impl<K, V, D> MultiProbeLsh<K, V, D>
where
    K: AsRef<[f32]>,
    D: Metric,
{
    /// Calibrates the default probe budget and candidate limit.
    ///
    /// `oracle` must index the same entries as this index (same keys, same
    /// insertion order); `sample` should be keys already inserted. Entries
    /// inserted later are searchable but carry no recall expectation until
    /// the next fit.
    ///
    /// # Errors
    ///
    /// Returns an error if the fit parameters are invalid, the sample is
    /// empty or has the wrong dimension, or the oracle reports an index this
    /// index doesn't hold. Missing the target recall is not an error.
    pub fn fit<G, Q>(&mut self, oracle: &G, sample: &[Q], config: &FitConfig) -> Result<&Calibration>
    where
        G: GroundTruth + ?Sized,
        Q: AsRef<[f32]>,
    {
        config.validate()?;
        if sample.is_empty() {
            return Err(Error::InvalidParameter("fit sample must not be empty".into()));
        }
        for query in sample {
            self.check_dimension(query.as_ref())?;
        }

        let truths = self.ground_truth(oracle, sample, config.radius)?;
        let models = self.estimate_models(sample, &truths);
        let total: usize = truths.iter().map(Vec::len).sum();

        let mut probes = 1;
        let (recall, max_candidates) = loop {
            let (found, most) = self.measure(sample, &truths, probes);
            let recall = if total == 0 {
                1.0
            } else {
                found as f64 / total as f64
            };
            tracing::debug!(probes, recall, max_candidates = most, "calibration step");

            if recall >= config.target_recall || probes >= config.max_probes {
                break (recall, most.max(1));
            }
            probes = probes.saturating_mul(2).min(config.max_probes);
        };

        let calibration = Calibration {
            probes,
            max_candidates,
            recall,
            target_recall: config.target_recall,
            radius: config.radius,
            models,
        };

        if calibration.reached_target() {
            tracing::info!(
                probes,
                max_candidates,
                recall,
                sample = sample.len(),
                "calibration complete"
            );
        } else {
            tracing::warn!(
                probes,
                recall,
                target = config.target_recall,
                "target recall not reached within probe ceiling"
            );
        }

        Ok(&*self.calibration.insert(calibration))
    }

    /// True neighbors of each sample point, excluding exact duplicates.
    fn ground_truth<G, Q>(&self, oracle: &G, sample: &[Q], radius: f32) -> Result<Vec<Vec<usize>>>
    where
        G: GroundTruth + ?Sized,
        Q: AsRef<[f32]>,
    {
        let len = self.len();
        sample
            .iter()
            .map(|query| {
                let mut truth = Vec::new();
                for neighbor in oracle.range(query.as_ref(), radius) {
                    if neighbor.index >= len {
                        return Err(Error::OracleMismatch {
                            index: neighbor.index,
                            len,
                        });
                    }
                    if neighbor.distance > 0.0 {
                        truth.push(neighbor.index);
                    }
                }
                Ok(truth)
            })
            .collect()
    }

    /// Fits one collision model per table from sample/neighbor projection gaps.
    fn estimate_models<Q: AsRef<[f32]>>(
        &self,
        sample: &[Q],
        truths: &[Vec<usize>],
    ) -> Vec<Option<CollisionModel>> {
        self.tables
            .iter()
            .enumerate()
            .map(|(t, table)| {
                let mut sum_sq = 0.0;
                let mut count = 0usize;
                for (query, truth) in sample.iter().zip(truths) {
                    if truth.is_empty() {
                        continue;
                    }
                    let from = table.project(query.as_ref());
                    for &index in truth {
                        let to = table.project(self.keys[index].as_ref());
                        for gap in from.scaled_difference(&to) {
                            sum_sq += gap * gap;
                            count += 1;
                        }
                    }
                }
                if count == 0 {
                    return None;
                }
                let sigma = (sum_sq / count as f64).sqrt();
                tracing::debug!(table = t, sigma, gaps = count, "collision model fitted");
                CollisionModel::new(sigma)
            })
            .collect()
    }

    /// Returns (true neighbors found, largest candidate set) at a probe budget.
    fn measure<Q: AsRef<[f32]>>(
        &self,
        sample: &[Q],
        truths: &[Vec<usize>],
        probes: usize,
    ) -> (usize, usize) {
        let plan = ProbePlan {
            probes,
            recall: None,
            max_candidates: usize::MAX,
            first_hit: false,
        };

        let mut found = 0;
        let mut most = 0;
        for (query, truth) in sample.iter().zip(truths) {
            let candidates = self.gather(query.as_ref(), &plan);
            most = most.max(candidates.len());
            if truth.is_empty() {
                continue;
            }
            let candidates: HashSet<usize> = candidates.into_iter().collect();
            found += truth.iter().filter(|&&i| candidates.contains(&i)).count();
        }
        (found, most)
    }
}

/// Outcome of [`evaluate_nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestReport {
    /// Number of queries run.
    pub queries: usize,
    /// Queries that returned a neighbor.
    pub hits: usize,
    /// Hits that matched the oracle's nearest neighbor.
    pub exact: usize,
    /// Mean relative distance error over hits that missed the true nearest
    /// neighbor. NaN when there were no such misses.
    pub miss_error: f64,
}

impl NearestReport {
    /// Fraction of queries answered with the true nearest neighbor.
    pub fn recall(&self) -> f64 {
        self.exact as f64 / self.queries as f64
    }

    /// Fraction of queries that returned nothing.
    pub fn null_rate(&self) -> f64 {
        1.0 - self.hits as f64 / self.queries as f64
    }
}

/// Compares single-nearest-neighbor answers with an exact oracle.
///
/// # Errors
///
/// Propagates query errors (e.g. a dimension mismatch). Returns
/// [`Error::OracleEmpty`] if the oracle has no answer for a query the index
/// answered.
pub fn evaluate_nearest<K, V, D, G, Q>(
    index: &MultiProbeLsh<K, V, D>,
    oracle: &G,
    queries: &[Q],
) -> Result<NearestReport>
where
    K: AsRef<[f32]>,
    D: Metric,
    G: GroundTruth + ?Sized,
    Q: AsRef<[f32]>,
{
    let mut hits = 0;
    let mut exact = 0;
    let mut error = 0.0f64;

    for query in queries {
        let Some(found) = index.nearest(query.as_ref())? else {
            continue;
        };
        hits += 1;
        match oracle.nearest(query.as_ref()) {
            Some(truth) if truth.index == found.index => exact += 1,
            Some(truth) => {
                error += ((found.distance - truth.distance).abs() / truth.distance) as f64
            }
            None => return Err(Error::OracleEmpty),
        }
    }

    Ok(NearestReport {
        queries: queries.len(),
        hits,
        exact,
        miss_error: error / (hits - exact) as f64,
    })
}
