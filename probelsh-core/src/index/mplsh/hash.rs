//! Random-projection hash functions (p-stable LSH for Euclidean distance).
//!
//! Each function is `h(x) = floor((a · x + b) / w)` with `a` drawn from a
//! standard Gaussian and `b` uniform in `[0, w)`. One [`ProjectionHash`]
//! bundles the `M` functions of a single table.

use rand::Rng;

/// The projections of one table.
#[derive(Debug, Clone)]
pub struct ProjectionHash {
    dimension: usize,
    width: f64,
    /// Row-major `M x dimension` matrix of projection directions.
    directions: Vec<f32>,
    /// One offset per projection, uniform in `[0, width)`.
    offsets: Vec<f64>,
}

/// A vector's projections onto one table's hash functions.
///
/// Keeps the unquantized values alongside the bucket key because the probe
/// sequencer needs to know how close each value sits to a bucket boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    raw: Vec<f64>,
    key: Vec<i32>,
    width: f64,
}

impl ProjectionHash {
    /// Draws `projections` hash functions over `dimension`-dimensional input.
    ///
    /// The draw order is fixed (directions then offset, projection by
    /// projection), so the same generator state always yields the same functions.
    pub fn new<R: Rng + ?Sized>(
        dimension: usize,
        projections: usize,
        width: f64,
        rng: &mut R,
    ) -> Self {
        let mut directions = Vec::with_capacity(projections * dimension);
        let mut offsets = Vec::with_capacity(projections);

        for _ in 0..projections {
            directions.extend((0..dimension).map(|_| standard_normal(rng) as f32));
            offsets.push(rng.gen_range(0.0..width));
        }

        Self {
            dimension,
            width,
            directions,
            offsets,
        }
    }

    /// Number of hash functions (M).
    #[inline]
    pub fn projections(&self) -> usize {
        self.offsets.len()
    }

    /// Bucket width (w).
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Projects a vector onto every hash function of this table.
    ///
    /// The caller guarantees `vector.len() == dimension`.
    pub fn project(&self, vector: &[f32]) -> Projection {
        debug_assert_eq!(vector.len(), self.dimension);

        let raw: Vec<f64> = self
            .directions
            .chunks_exact(self.dimension)
            .zip(&self.offsets)
            .map(|(direction, &offset)| {
                let dot: f64 = direction
                    .iter()
                    .zip(vector)
                    .map(|(&a, &x)| a as f64 * x as f64)
                    .sum();
                dot + offset
            })
            .collect();

        Projection::from_raw(raw, self.width)
    }
}

impl Projection {
    /// Quantizes unscaled projection values with bucket width `width`.
    pub(crate) fn from_raw(raw: Vec<f64>, width: f64) -> Self {
        let key = raw
            .iter()
            .map(|&value| (value / width).floor() as i32)
            .collect();
        Self { raw, key, width }
    }

    /// Unquantized `a · x + b` per hash function.
    #[inline]
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Quantized bucket key, one integer per hash function.
    #[inline]
    pub fn key(&self) -> &[i32] {
        &self.key
    }

    /// Position of projection `i` inside its bucket, in `[0, 1)` of a width.
    ///
    /// `offset` is the distance to the lower boundary and `1 - offset` the
    /// distance to the upper one.
    #[inline]
    pub fn offset(&self, i: usize) -> f64 {
        (self.raw[i] / self.width - self.key[i] as f64).clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Per-function difference `other - self`, in units of bucket width.
    pub(crate) fn scaled_difference<'a>(
        &'a self,
        other: &'a Projection,
    ) -> impl Iterator<Item = f64> + 'a {
        self.raw
            .iter()
            .zip(&other.raw)
            .map(move |(a, b)| (b - a) / self.width)
    }
}

/// Draws a standard Gaussian sample.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Box-Muller; `1 - u` keeps the logarithm finite.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_same_seed_same_functions() {
        let a = ProjectionHash::new(16, 4, 2.0, &mut StdRng::seed_from_u64(42));
        let b = ProjectionHash::new(16, 4, 2.0, &mut StdRng::seed_from_u64(42));
        let c = ProjectionHash::new(16, 4, 2.0, &mut StdRng::seed_from_u64(43));

        let x: Vec<f32> = (0..16).map(|i| i as f32 * 0.1).collect();
        assert_eq!(a.project(&x), b.project(&x));
        assert_ne!(a.project(&x).raw(), c.project(&x).raw());
    }

    #[test]
    fn test_key_is_floor_of_scaled_raw() {
        let hash = ProjectionHash::new(8, 5, 0.5, &mut StdRng::seed_from_u64(1));
        let x = [0.3f32, -1.2, 0.8, 2.5, -0.4, 0.0, 1.1, -2.0];
        let projection = hash.project(&x);

        assert_eq!(projection.key().len(), 5);
        for i in 0..5 {
            let expected = (projection.raw()[i] / 0.5).floor() as i32;
            assert_eq!(projection.key()[i], expected);
            let offset = projection.offset(i);
            assert!((0.0..1.0).contains(&offset));
        }
    }

    #[test]
    fn test_offsets_within_width() {
        let hash = ProjectionHash::new(4, 64, 3.0, &mut StdRng::seed_from_u64(9));
        assert_eq!(hash.projections(), 64);
        assert!(hash.offsets.iter().all(|&b| (0.0..3.0).contains(&b)));

        // Projecting the origin exposes the offsets directly.
        let projection = hash.project(&[0.0; 4]);
        assert_eq!(projection.raw(), hash.offsets.as_slice());
        assert!(projection.key().iter().all(|&k| k == 0));
    }

    #[test]
    fn test_directions_look_gaussian() {
        let hash = ProjectionHash::new(1000, 4, 1.0, &mut StdRng::seed_from_u64(5));
        let n = hash.directions.len() as f64;
        let mean = hash.directions.iter().map(|&a| a as f64).sum::<f64>() / n;
        let var = hash
            .directions
            .iter()
            .map(|&a| (a as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 0.08, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.1, "variance {}", var);
    }

    #[test]
    fn test_scaled_difference() {
        let hash = ProjectionHash::new(2, 3, 2.0, &mut StdRng::seed_from_u64(3));
        let p = hash.project(&[1.0, 1.0]);
        let q = hash.project(&[1.0, 1.0]);
        assert!(p.scaled_difference(&q).all(|d| d == 0.0));
    }
}
