//! # probelsh
//!
//! **Multi-probe locality-sensitive hashing for approximate nearest neighbor search.**
//!
//! probelsh indexes dense `f32` vectors in a handful of hash tables and
//! answers nearest, k-nearest and range queries by probing a few
//! likely buckets per table instead of scanning everything.
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Multi-probe** | Query-directed probe sequences, cheapest bucket first |
//! | **Exact ranking** | Candidates are always ranked by true distance |
//! | **Calibration** | Fit probe budget and candidate limit to a target recall |
//! | **Pluggable metrics** | Euclidean, Manhattan, Cosine, Hamming, or any closure |
//! | **Deterministic** | Seeded projections give reproducible indexes |
//!
//! ## Quick Start
//!
//! ```rust
//! use probelsh::prelude::*;
//!
//! let config = LshConfig::new(4, 8, 3, 2.0).with_seed(42).with_probes(8);
//! let mut index: MultiProbeLsh<Vec<f32>, &str> =
//!     MultiProbeLsh::new(config, DistanceMetric::Euclidean).unwrap();
//!
//! index.insert(vec![0.0, 0.0, 0.0, 0.0], "a").unwrap();
//! index.insert(vec![0.1, 0.0, 0.2, 0.0], "b").unwrap();
//! index.insert(vec![9.0, 9.0, 9.0, 9.0], "c").unwrap();
//!
//! let results = index.search(&[0.0, 0.0, 0.1, 0.0], 2).unwrap();
//! assert_eq!(results[0].index, 0);
//! ```
//!
//! ### Calibrating Against Exact Search
//!
//! ```rust
//! use probelsh::prelude::*;
//!
//! let keys: Vec<Vec<f32>> = (0..200)
//!     .map(|i| vec![(i % 10) as f32, (i / 10) as f32 * 0.5])
//!     .collect();
//!
//! let mut index = MultiProbeLsh::new(
//!     LshConfig::new(2, 6, 2, 3.0).with_seed(1),
//!     DistanceMetric::Euclidean,
//! )
//! .unwrap();
//! for (i, key) in keys.iter().enumerate() {
//!     index.insert(key.clone(), i).unwrap();
//! }
//!
//! let oracle = LinearSearch::of(keys.clone(), DistanceMetric::Euclidean).unwrap();
//! let calibration = index
//!     .fit(&oracle, &keys[..50], &FitConfig::new(1.0).with_target_recall(0.9))
//!     .unwrap();
//! assert!(calibration.probes() >= 1);
//!
//! // Ask for 95% recall with at most 50 candidates.
//! let neighbors = index.knn(&[3.0, 2.0], 5, 0.95, 50).unwrap();
//! assert!(neighbors.len() <= 5);
//! ```
//!
//! ## Architecture
//!
//! probelsh is organized into two crates:
//!
//! - **`probelsh-core`** - Hashing, probing, calibration and search
//! - **`probelsh`** - Main crate that re-exports everything
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::Result), which uses
//! the [`Error`] enum for error types. Dimension mismatches are errors, not
//! panics.
//!
//! ## Thread Safety
//!
//! - [`MultiProbeLsh`] is `Send + Sync` when its keys, values and metric are; queries take `&self`, inserts and fits take `&mut self`
//! - [`SharedIndex`] wraps an index in a `RwLock` for concurrent readers and writers

// Re-export everything from core
pub use probelsh_core::*;
