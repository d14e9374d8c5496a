//! Construction, query and calibration parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Construction parameters for a [`MultiProbeLsh`](crate::MultiProbeLsh) index.
///
/// These are fixed for the lifetime of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LshConfig {
    /// Dimensionality of every key vector.
    pub dimension: usize,
    /// Number of independent hash tables (L).
    pub tables: usize,
    /// Number of random projections per table (M).
    pub projections: usize,
    /// Quantization width of a projected value (w).
    pub width: f64,
    /// Seed for the generator that draws the projections.
    pub seed: u64,
    /// Per-table probe budget used until the index is calibrated.
    pub probes: usize,
}

impl LshConfig {
    /// Creates a config with the given shape, seed 0 and a single probe per table.
    pub fn new(dimension: usize, tables: usize, projections: usize, width: f64) -> Self {
        Self {
            dimension,
            tables,
            projections,
            width,
            seed: 0,
            probes: 1,
        }
    }

    /// Sets the random seed. Chainable.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the default per-table probe budget. Chainable.
    pub fn with_probes(mut self, probes: usize) -> Self {
        self.probes = probes;
        self
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be positive".into()));
        }
        if self.tables == 0 {
            return Err(Error::InvalidConfig("number of tables must be positive".into()));
        }
        if self.projections == 0 {
            return Err(Error::InvalidConfig(
                "number of projections must be positive".into(),
            ));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "width must be finite and positive, got {}",
                self.width
            )));
        }
        if self.probes == 0 {
            return Err(Error::InvalidConfig("probe budget must be positive".into()));
        }
        Ok(())
    }
}

/// Per-query overrides.
///
/// Unset fields fall back to the calibration, then to [`LshConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryOptions {
    /// Maximum number of buckets probed per table.
    pub probes: Option<usize>,
    /// Target recall in (0, 1]; stops probing a table early once reached.
    pub recall: Option<f64>,
    /// Maximum number of distinct candidates scored.
    pub max_candidates: Option<usize>,
}

impl QueryOptions {
    /// Options that inherit everything from the index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-table probe budget. Chainable.
    pub fn with_probes(mut self, probes: usize) -> Self {
        self.probes = Some(probes);
        self
    }

    /// Sets the target recall. Chainable.
    pub fn with_recall(mut self, recall: f64) -> Self {
        self.recall = Some(recall);
        self
    }

    /// Sets the candidate limit. Chainable.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = Some(max_candidates);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.probes == Some(0) {
            return Err(Error::InvalidParameter("probe budget must be positive".into()));
        }
        if let Some(recall) = self.recall {
            check_recall(recall)?;
        }
        if self.max_candidates == Some(0) {
            return Err(Error::InvalidParameter(
                "max_candidates must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters for [`MultiProbeLsh::fit`](crate::MultiProbeLsh::fit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Neighbors of a sample point within this distance count as true neighbors.
    pub radius: f32,
    /// Recall the calibrated probe budget should reach.
    pub target_recall: f64,
    /// Largest probe budget tried.
    pub max_probes: usize,
}

impl FitConfig {
    /// Creates a fit config for the given radius with target recall 0.95.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            target_recall: 0.95,
            max_probes: 1024,
        }
    }

    /// Sets the target recall. Chainable.
    pub fn with_target_recall(mut self, recall: f64) -> Self {
        self.target_recall = recall;
        self
    }

    /// Sets the probe budget ceiling. Chainable.
    pub fn with_max_probes(mut self, max_probes: usize) -> Self {
        self.max_probes = max_probes;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "radius must be finite and positive, got {}",
                self.radius
            )));
        }
        check_recall(self.target_recall)?;
        if self.max_probes == 0 {
            return Err(Error::InvalidParameter("max_probes must be positive".into()));
        }
        Ok(())
    }
}

fn check_recall(recall: f64) -> Result<()> {
    if recall > 0.0 && recall <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "recall must be in (0, 1], got {}",
            recall
        )))
    }
}
