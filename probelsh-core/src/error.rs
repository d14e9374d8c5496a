//! Error types for probelsh operations.

use thiserror::Error;

/// Result type alias using probelsh's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during index construction, insertion, queries and fitting.
///
/// "Nothing found" is never an error: queries report it as `None` or an empty `Vec`.
#[derive(Debug, Error)]
pub enum Error {
    /// Vector dimension mismatch between index and input.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Construction parameters out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Query or fit parameter out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The ground-truth oracle returned an index the LSH index does not hold.
    #[error("oracle returned index {index}, but the index holds {len} entries")]
    OracleMismatch { index: usize, len: usize },

    /// The ground-truth oracle found nothing for a query the LSH index answered.
    #[error("oracle has no nearest neighbor for a query the index answered")]
    OracleEmpty,
}
