// Errors raised by the density clustering core.
//
// The rest of the crate works in anyhow; these variants exist so callers
// (and tests) can tell bad input apart from bad parameters.

use thiserror::Error;

/// Errors returned by the clustering backends and importers.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// No points to cluster.
    #[error("empty input")]
    EmptyInput,

    /// A hyperparameter is out of range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// Points have inconsistent dimensionality.
    #[error("dimension mismatch at point {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate at point {index}")]
    NonFinite { index: usize },

    /// An imported clustering does not line up with the table it describes.
    #[error("imported clustering is inconsistent: {0}")]
    Inconsistent(String),
}

impl ClusterError {
    pub fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
