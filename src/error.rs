//! Error types for PatchCore scoring.

use thiserror::Error;

/// PatchCore error types.
///
/// Every variant is structural or configuration related; none is transient,
/// so nothing in the crate retries.
#[derive(Error, Debug)]
pub enum PatchCoreError {
    /// Feature map is not `[1, C, H, W]` or its buffer does not fit the shape
    #[error("Shape error: {0}")]
    Shape(String),

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Buffer length not evenly divisible by its row dimension
    #[error("Invalid length: {what} length {len} not divisible by {divisor}")]
    InvalidLength {
        what: &'static str,
        len: usize,
        divisor: usize,
    },

    /// Embedding and gallery dimensions disagree outside the sanctioned slice
    #[error("Dimension mismatch: patch dim {query}, gallery dim {gallery}")]
    DimensionMismatch { query: usize, gallery: usize },

    /// Metric identifier is not one of the supported ones
    #[error("Unknown metric: {0:?} (expected \"ip\" or \"l2\")")]
    UnknownMetric(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for PatchCore operations.
pub type Result<T> = std::result::Result<T, PatchCoreError>;
