//! Query-directed multi-probe sequence.
//!
//! For one query and one table, buckets are visited in order of an
//! estimated miss cost instead of only looking at the query's own bucket.
//! Moving coordinate `i` of the bucket key by -1 or +1 costs the squared
//! distance (in bucket widths) from the query's projection to the boundary
//! crossed. A probe's score is the sum of the costs of its steps.
//!
//! The `2M` steps are sorted once by cost and perturbation sets are
//! generated lazily from a min-heap with the shift/expand rules, so every
//! subset is produced exactly once and in non-decreasing score order
//! without materializing the `3^M` reachable buckets.
//!
//! # References
//!
//! - Lv, Josephson, Wang, Charikar & Li (2007): "Multi-Probe LSH: Efficient
//!   Indexing for High-Dimensional Similarity Search"

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::iter::FusedIterator;

use super::hash::Projection;

/// Moving one key coordinate to an adjacent bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Which hash function's coordinate moves.
    pub projection: usize,
    /// -1 (lower bucket) or +1 (upper bucket).
    pub delta: i32,
    /// Squared distance to the crossed boundary, in bucket widths.
    pub cost: f64,
}

/// A bucket to visit.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    /// Bucket key.
    pub key: Vec<i32>,
    /// Sum of step costs; 0 for the query's own bucket.
    pub score: f64,
    /// Steps applied to the query's own key, in increasing cost order.
    pub steps: Vec<Step>,
}

/// A set of indices into the sorted step list, kept sorted ascending.
#[derive(Debug, Clone)]
struct PerturbationSet {
    members: Vec<usize>,
    score: f64,
}

impl PerturbationSet {
    fn new(members: Vec<usize>, steps: &[Step]) -> Self {
        let score = members.iter().map(|&m| steps[m].cost).sum();
        Self { members, score }
    }

    fn last(&self) -> usize {
        self.members[self.members.len() - 1]
    }

    /// Replaces the largest member with its successor.
    fn shift(&self, steps: &[Step]) -> Self {
        let mut members = self.members.clone();
        let last = members.len() - 1;
        members[last] += 1;
        Self::new(members, steps)
    }

    /// Adds the successor of the largest member.
    fn expand(&self, steps: &[Step]) -> Self {
        let mut members = self.members.clone();
        members.push(self.last() + 1);
        Self::new(members, steps)
    }

    /// A set is a real bucket only if no coordinate moves both ways.
    fn is_valid(&self, steps: &[Step]) -> bool {
        self.members.iter().enumerate().all(|(i, &a)| {
            self.members[i + 1..]
                .iter()
                .all(|&b| steps[a].projection != steps[b].projection)
        })
    }
}

impl PartialEq for PerturbationSet {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PerturbationSet {}

impl PartialOrd for PerturbationSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PerturbationSet {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; members break score ties deterministically.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.members.cmp(&self.members))
    }
}

/// Lazy, finite, non-restartable sequence of buckets for one (query, table) pair.
///
/// Yields the query's own bucket first, then perturbed buckets in
/// non-decreasing score order, until `budget` probes have been produced or
/// every bucket within one step per coordinate has been visited.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    projection: Projection,
    steps: Vec<Step>,
    heap: BinaryHeap<PerturbationSet>,
    budget: usize,
    emitted: usize,
}

impl ProbeSequence {
    /// Creates the sequence for a query's projection onto one table.
    pub fn new(projection: Projection, budget: usize) -> Self {
        let m = projection.key().len();
        let mut steps = Vec::with_capacity(2 * m);
        for i in 0..m {
            let below = projection.offset(i);
            let above = 1.0 - below;
            steps.push(Step {
                projection: i,
                delta: -1,
                cost: below * below,
            });
            steps.push(Step {
                projection: i,
                delta: 1,
                cost: above * above,
            });
        }
        steps.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then(a.projection.cmp(&b.projection))
                .then(a.delta.cmp(&b.delta))
        });

        let mut heap = BinaryHeap::new();
        if !steps.is_empty() {
            heap.push(PerturbationSet::new(vec![0], &steps));
        }

        Self {
            projection,
            steps,
            heap,
            budget,
            emitted: 0,
        }
    }

    /// The query's projection this sequence was built from.
    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Number of probes yielded so far.
    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn push_successors(&mut self, set: &PerturbationSet) {
        if set.last() + 1 < self.steps.len() {
            self.heap.push(set.shift(&self.steps));
            self.heap.push(set.expand(&self.steps));
        }
    }

    fn probe(&self, set: &PerturbationSet) -> Probe {
        let mut key = self.projection.key().to_vec();
        let steps: Vec<Step> = set.members.iter().map(|&m| self.steps[m]).collect();
        for step in &steps {
            key[step.projection] = key[step.projection].saturating_add(step.delta);
        }
        Probe {
            key,
            score: set.score,
            steps,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = Probe;

    fn next(&mut self) -> Option<Probe> {
        if self.emitted >= self.budget {
            return None;
        }

        if self.emitted == 0 {
            self.emitted = 1;
            return Some(Probe {
                key: self.projection.key().to_vec(),
                score: 0.0,
                steps: Vec::new(),
            });
        }

        while let Some(set) = self.heap.pop() {
            self.push_successors(&set);
            if set.is_valid(&self.steps) {
                self.emitted += 1;
                return Some(self.probe(&set));
            }
        }

        None
    }
}

impl FusedIterator for ProbeSequence {}

/// Gaussian model of where a true neighbor's projection lands.
///
/// The difference between a query's and a neighbor's projection, in bucket
/// widths, is modeled as `N(0, sigma^2)`. The probability that the neighbor
/// sits in a probed bucket is the product, over hash functions, of the
/// Gaussian mass of the probed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionModel {
    sigma: f64,
}

impl CollisionModel {
    /// Returns `None` unless `sigma` is finite and positive.
    pub fn new(sigma: f64) -> Option<Self> {
        (sigma.is_finite() && sigma > 0.0).then_some(Self { sigma })
    }

    /// Standard deviation of projection differences, in bucket widths.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Probability that a neighbor of the query falls in `probe`'s bucket.
    pub fn probability(&self, projection: &Projection, probe: &Probe) -> f64 {
        let mut log_p = 0.0;
        for (i, (&key, &probed)) in projection.key().iter().zip(&probe.key).enumerate() {
            let delta = probed.saturating_sub(key);
            let mass = self.interval_mass(projection.offset(i), delta);
            if mass <= 0.0 {
                return 0.0;
            }
            log_p += mass.ln();
        }
        log_p.exp()
    }

    /// Mass of `N(offset, sigma^2)` on `[delta, delta + 1)`.
    fn interval_mass(&self, offset: f64, delta: i32) -> f64 {
        let lo = (delta as f64 - offset) / self.sigma;
        let hi = (delta as f64 + 1.0 - offset) / self.sigma;
        (normal_cdf(hi) - normal_cdf(lo)).max(0.0)
    }
}

/// Standard normal CDF.
fn normal_cdf(z: f64) -> f64 {
    let x = z.abs() / std::f64::consts::SQRT_2;
    let tail = 0.5 * erfc(x);
    if z >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Complementary error function for `x >= 0` (Abramowitz & Stegun 7.1.26).
fn erfc(x: f64) -> f64 {
    const P: f64 = 0.327_591_1;
    const A: [f64; 5] = [
        0.254_829_592,
        -0.284_496_736,
        1.421_413_741,
        -1.453_152_027,
        1.061_405_429,
    ];
    let t = 1.0 / (1.0 + P * x);
    let poly = A.iter().rev().fold(0.0, |acc, &a| acc * t + a) * t;
    poly * (-x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Projection with width 1 whose offsets equal the given fractions.
    fn projection(fractions: &[f64]) -> Projection {
        let raw = fractions
            .iter()
            .enumerate()
            .map(|(i, f)| i as f64 * 3.0 + f)
            .collect();
        Projection::from_raw(raw, 1.0)
    }

    #[test]
    fn test_own_bucket_first() {
        let p = projection(&[0.3, 0.7, 0.5]);
        let own = p.key().to_vec();
        let mut sequence = ProbeSequence::new(p, 10);
        let first = sequence.next().unwrap();
        assert_eq!(first.key, own);
        assert_eq!(first.score, 0.0);
        assert!(first.steps.is_empty());
    }

    #[test]
    fn test_single_projection_yields_two_adjacent_buckets() {
        // Closer to the upper boundary, so +1 comes before -1.
        let p = projection(&[0.8]);
        let own = p.key()[0];
        let probes: Vec<_> = ProbeSequence::new(p, 100).collect();

        let keys: Vec<i32> = probes.iter().map(|probe| probe.key[0]).collect();
        assert_eq!(keys, vec![own, own + 1, own - 1]);
        assert!((probes[1].score - 0.04).abs() < 1e-9);
        assert!((probes[2].score - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_single_projection_lower_boundary_first() {
        let p = projection(&[0.1]);
        let own = p.key()[0];
        let keys: Vec<i32> = ProbeSequence::new(p, 100).map(|probe| probe.key[0]).collect();
        assert_eq!(keys, vec![own, own - 1, own + 1]);
    }

    #[test]
    fn test_exhausts_all_adjacent_buckets() {
        let p = projection(&[0.2, 0.6, 0.45]);
        let own = p.key().to_vec();
        let probes: Vec<_> = ProbeSequence::new(p, usize::MAX).collect();

        // Every coordinate moves by -1, 0 or +1.
        assert_eq!(probes.len(), 27);
        let distinct: HashSet<_> = probes.iter().map(|probe| probe.key.clone()).collect();
        assert_eq!(distinct.len(), 27);
        for probe in &probes {
            for (k, o) in probe.key.iter().zip(&own) {
                assert!((k - o).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_scores_non_decreasing() {
        let p = projection(&[0.11, 0.93, 0.47, 0.52, 0.3, 0.05]);
        let probes: Vec<_> = ProbeSequence::new(p, 200).collect();
        assert_eq!(probes.len(), 200);
        for pair in probes.windows(2) {
            assert!(pair[0].score <= pair[1].score + 1e-12);
        }
    }

    #[test]
    fn test_second_probe_is_cheapest_step() {
        let p = projection(&[0.5, 0.97, 0.4]);
        let own = p.key().to_vec();
        let mut sequence = ProbeSequence::new(p, 5);
        sequence.next();
        let second = sequence.next().unwrap();

        let mut expected = own;
        expected[1] += 1;
        assert_eq!(second.key, expected);
        assert_eq!(second.steps.len(), 1);
        assert_eq!(second.steps[0].projection, 1);
        assert_eq!(second.steps[0].delta, 1);
    }

    #[test]
    fn test_budget_caps_sequence() {
        let p = projection(&[0.5, 0.5]);
        let mut sequence = ProbeSequence::new(p, 4);
        assert_eq!(sequence.by_ref().count(), 4);
        assert_eq!(sequence.emitted(), 4);
        assert!(sequence.next().is_none());

        let none = ProbeSequence::new(projection(&[0.5]), 0).count();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_budget_prefix_is_stable() {
        let fractions = [0.31, 0.77, 0.02, 0.64];
        let short: Vec<_> = ProbeSequence::new(projection(&fractions), 10).collect();
        let long: Vec<_> = ProbeSequence::new(projection(&fractions), 40).collect();
        assert_eq!(short[..], long[..10]);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.959_964) - 0.975).abs() < 1e-6);
        assert!((normal_cdf(-1.959_964) - 0.025).abs() < 1e-6);
        assert!(normal_cdf(-40.0) >= 0.0);
        assert!(normal_cdf(40.0) <= 1.0);
    }

    #[test]
    fn test_collision_model_requires_positive_sigma() {
        assert!(CollisionModel::new(0.0).is_none());
        assert!(CollisionModel::new(f64::NAN).is_none());
        assert_eq!(CollisionModel::new(0.25).unwrap().sigma(), 0.25);
    }

    #[test]
    fn test_collision_probabilities_follow_probe_order() {
        let model = CollisionModel::new(0.3).unwrap();
        let p = projection(&[0.5, 0.8]);
        let probes: Vec<_> = ProbeSequence::new(p.clone(), usize::MAX).collect();
        let probabilities: Vec<f64> = probes.iter().map(|probe| model.probability(&p, probe)).collect();

        // Own bucket is the most likely, and all buckets together cover at most 1.
        let total: f64 = probabilities.iter().sum();
        assert!(total <= 1.0 + 1e-6);
        assert!(total > 0.9);
        assert!(probabilities[1..].iter().all(|&q| q <= probabilities[0]));
        // Stepping toward the near boundary beats stepping away from it.
        assert!(probabilities[1] > probabilities[probabilities.len() - 1]);
    }
}
