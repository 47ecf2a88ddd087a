//! Error types for image operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid parameter value (size, shape/dimensionality combination).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Label does not name a known operation, shape or enhancement.
    #[error("unknown {kind} label: '{label}'")]
    UnknownLabel {
        /// What was being parsed ("operation", "shape", ...)
        kind: &'static str,
        /// The offending label
        label: String,
    },

    /// Image buffer error from gran-core.
    #[error(transparent)]
    Image(#[from] gran_core::Error),
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;
