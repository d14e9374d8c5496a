//! Distance functions used to rank candidates.
//!
//! The index treats distance as an opaque pairwise function: anything that
//! implements [`Metric`] can rank candidates, including plain closures.
//! Hashing is always done with Gaussian random projections, so the recall
//! guarantees of the hash family hold for [`DistanceMetric::Euclidean`];
//! other metrics still get exact ranking among the retrieved candidates.

use serde::{Deserialize, Serialize};

/// A pairwise distance function.
///
/// Implementations must be non-negative, symmetric, zero for identical
/// inputs, and return the same value for the same inputs for the lifetime
/// of an index.
pub trait Metric {
    /// Computes the distance between `a` and `b`.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

impl<F> Metric for F
where
    F: Fn(&[f32], &[f32]) -> f32,
{
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance (L2 norm).
    #[default]
    Euclidean,
    /// Manhattan distance (L1 norm).
    Manhattan,
    /// Cosine distance (1 - cosine similarity), in [0, 2].
    Cosine,
    /// Hamming distance for binary-like vectors.
    Hamming,
}

impl DistanceMetric {
    /// Computes the distance between two vectors using this metric.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Hamming => hamming_distance(a, b),
        }
    }
}

impl Metric for DistanceMetric {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.compute(a, b)
    }
}

/// Computes Euclidean (L2) distance between two vectors.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Computes squared Euclidean distance (avoids sqrt for comparisons).
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Computes Manhattan (L1) distance between two vectors.
#[inline]
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Computes cosine distance between two vectors.
///
/// Formula: 1 - (a · b) / (||a|| * ||b||)
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 1.0;
    }

    // Rounding can push identical directions slightly below zero.
    (1.0 - (dot / denominator)).max(0.0)
}

/// Computes dot product (inner product) between two vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Computes Hamming distance for binary-like vectors.
///
/// Treats values > 0.5 as 1 and <= 0.5 as 0, then counts differences.
#[inline]
pub fn hamming_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| (**x > 0.5) != (**y > 0.5))
        .count() as f32
}

/// Dynamic time warping distance between two series.
///
/// Local cost is the absolute difference of samples. The series may have
/// different lengths; an empty series is infinitely far from a non-empty one.
pub fn dynamic_time_warping(a: &[f32], b: &[f32]) -> f32 {
    dtw(a, b, usize::MAX)
}

/// Dynamic time warping restricted to a Sakoe-Chiba band.
///
/// Only alignments with `|i - j| <= radius` are considered, so a narrow band
/// can produce a larger distance than [`dynamic_time_warping`].
pub fn dynamic_time_warping_band(a: &[f32], b: &[f32], radius: usize) -> f32 {
    dtw(a, b, radius)
}

fn dtw(a: &[f32], b: &[f32], radius: usize) -> f32 {
    let m = b.len();
    // Two rolling rows of the (n+1) x (m+1) cumulative cost table.
    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for (i, &x) in a.iter().enumerate() {
        let row = i + 1;
        curr.fill(f64::INFINITY);
        let start = row.saturating_sub(radius).max(1);
        let end = row.saturating_add(radius).min(m);

        for col in start..=end {
            let cost = (x as f64 - b[col - 1] as f64).abs();
            let best = prev[col - 1].min(prev[col]).min(curr[col - 1]);
            curr[col] = cost + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m] as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_same_vector() {
        let a = [1.0, 2.0, 3.0];
        assert!(euclidean_distance(&a, &a) < 1e-10);
    }

    #[test]
    fn test_manhattan_distance() {
        let a = [1.0, -2.0, 3.0];
        let b = [0.0, 0.0, 0.0];
        assert!((manhattan_distance(&a, &b) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_orthogonal() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_never_negative() {
        let a = [0.3, 0.3, 0.3];
        assert!(cosine_distance(&a, &a) >= 0.0);
    }

    #[test]
    fn test_hamming_distance() {
        let a = [1.0, 0.0, 1.0, 0.0];
        let b = [1.0, 1.0, 0.0, 0.0];
        assert!((hamming_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_metric_for_closure() {
        let chebyshev = |a: &[f32], b: &[f32]| {
            a.iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0f32, f32::max)
        };
        assert!((chebyshev.distance(&[1.0, 5.0], &[2.0, 1.0]) - 4.0).abs() < 1e-6);
        assert!((DistanceMetric::Euclidean.distance(&[3.0, 4.0], &[0.0, 0.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_metric_is_euclidean() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
    }

    #[rustfmt::skip]
    const SINE: [f32; 100] = [
        0.02132777, 0.09703978, 0.16255642, 0.22105814, 0.33398156, 0.32564198,
        0.42268295, 0.52269017, 0.48765594, 0.55634671, 0.65624097, 0.68774409,
        0.76433694, 0.80966153, 0.86670319, 0.84257343, 0.92610981, 0.95989335,
        0.99023656, 1.01301426, 1.04399824, 1.03425819, 1.05169307, 1.09366509,
        1.02798314, 1.03288469, 1.02553048, 1.03751515, 1.04873364, 1.05895938,
        0.95813731, 0.93555851, 0.93275008, 0.91673172, 0.89417974, 0.80288556,
        0.81681172, 0.73713563, 0.72504936, 0.62317013, 0.58861397, 0.53925776,
        0.54439887, 0.41068102, 0.44036223, 0.30074895, 0.22783445, 0.16445066,
        0.18642505, 0.07171808, 0.05670306, -0.03006495, -0.15522562, -0.14426558,
        -0.18473828, -0.24693130, -0.31431100, -0.40359915, -0.41440738, -0.53263144,
        -0.52562415, -0.62711854, -0.69283723, -0.69100598, -0.75878944, -0.75375630,
        -0.84794539, -0.83241244, -0.84810036, -0.86027706, -0.91396262, -0.89504004,
        -0.89889403, -0.96119044, -0.92280725, -0.90323615, -0.95914998, -0.95634898,
        -0.88291497, -0.87008581, -0.93374950, -0.85472230, -0.86538045, -0.77472090,
        -0.73646217, -0.77478528, -0.73543266, -0.66507492, -0.58118079, -0.55081741,
        -0.48798299, -0.42903689, -0.36621047, -0.29122441, -0.25365820, -0.17839114,
        -0.13402881, -0.06656910, -0.06113676, 0.08480863,
    ];

    #[rustfmt::skip]
    const COSINE: [f32; 100] = [
        1.00000000, 0.99798872, 0.99196296, 0.98194696, 0.96798102, 0.95012130,
        0.92843966, 0.90302332, 0.87397449, 0.84141005, 0.80546098, 0.76627189,
        0.72400042, 0.67881661, 0.63090222, 0.58044997, 0.52766283, 0.47275313,
        0.41594175, 0.35745722, 0.29753479, 0.23641551, 0.17434523, 0.11157363,
        0.04835322, -0.01506169, -0.07841602, -0.14145491, -0.20392479, -0.26557437,
        -0.32615565, -0.38542496, -0.44314387, -0.49908020, -0.55300895, -0.60471318,
        -0.65398492, -0.70062595, -0.74444867, -0.78527680, -0.82294610, -0.85730504,
        -0.88821542, -0.91555289, -0.93920748, -0.95908406, -0.97510265, -0.98719883,
        -0.99532393, -0.99944528, -0.99954629, -0.99562656, -0.98770186, -0.97580406,
        -0.95998102, -0.94029639, -0.91682936, -0.88967432, -0.85894051, -0.82475155,
        -0.78724498, -0.74657166, -0.70289520, -0.65639130, -0.60724703, -0.55566006,
        -0.50183791, -0.44599708, -0.38836221, -0.32916512, -0.26864394, -0.20704212,
        -0.14460746, -0.08159111, -0.01824655, 0.04517140, 0.10840765, 0.17120782,
        0.23331930, 0.29449224, 0.35448056, 0.41304296, 0.46994386, 0.52495439,
        0.57785325, 0.62842766, 0.67647418, 0.72179953, 0.76422140, 0.80356913,
        0.83968446, 0.87242209, 0.90165036, 0.92725167, 0.94912305, 0.96717652,
        0.98133946, 0.99155489, 0.99778173, 0.99999493,
    ];

    #[test]
    fn test_dynamic_time_warping() {
        assert!((dynamic_time_warping(&SINE, &COSINE) - 24.57181).abs() < 1e-3);
    }

    #[test]
    fn test_dynamic_time_warping_band() {
        let expected = [(10, 65.82546), (20, 38.06896), (30, 24.57525), (40, 24.57181)];
        for (radius, distance) in expected {
            let got = dynamic_time_warping_band(&SINE, &COSINE, radius);
            assert!(
                (got - distance).abs() < 1e-3,
                "radius {}: expected {}, got {}",
                radius,
                distance,
                got
            );
        }
    }

    #[test]
    fn test_dynamic_time_warping_identity_and_empty() {
        assert_eq!(dynamic_time_warping(&SINE, &SINE), 0.0);
        assert!(dynamic_time_warping(&[], &[1.0]).is_infinite());
        assert_eq!(dynamic_time_warping(&[], &[]), 0.0);
    }
}
