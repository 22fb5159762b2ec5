//! Error types for dissimilarity computation.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, DfcError>;

/// Errors raised while normalizing snapshots or building dissimilarity matrices
#[derive(Error, Debug)]
pub enum DfcError {
    /// Subject tensor has the wrong rank or mismatched ROI axes
    #[error("Input shape error: expected {expected}, found {found:?}")]
    InputShape {
        /// Human-readable description of the accepted shape
        expected: String,
        /// Shape actually supplied
        found: Vec<usize>,
    },

    /// Unknown pipeline or metric identifier, or out-of-range option
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Distance matrix handed to the Rips construction is unusable
    #[error("Malformed distance matrix: {0}")]
    MalformedDistanceMatrix(String),

    /// Signature extraction failed for one timepoint; the whole subject is void
    #[error("Signature extraction failed at timepoint {timepoint}: {reason}")]
    Extraction {
        /// Zero-based timepoint index
        timepoint: usize,
        /// Underlying failure
        reason: String,
    },

    /// Per-subject deadline elapsed before the matrix was complete
    #[error("Deadline exceeded after {completed_rows}/{total_rows} rows")]
    DeadlineExceeded {
        /// Rows of the lower triangle already filled
        completed_rows: usize,
        /// Total number of rows (timepoints)
        total_rows: usize,
    },

    /// Input file content could not be interpreted as a numeric tensor or matrix
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DfcError {
    /// Shorthand for an input-shape error
    pub fn shape(expected: impl Into<String>, found: &[usize]) -> Self {
        Self::InputShape {
            expected: expected.into(),
            found: found.to_vec(),
        }
    }

    /// True for errors that void a single subject but leave a batch runnable
    pub fn is_subject_local(&self) -> bool {
        matches!(
            self,
            Self::InputShape { .. }
                | Self::MalformedDistanceMatrix(_)
                | Self::Extraction { .. }
                | Self::DeadlineExceeded { .. }
                | Self::InvalidInput(_)
        )
    }
}
