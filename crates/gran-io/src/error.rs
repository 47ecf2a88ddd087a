//! Error types for I/O operations.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported or unrecognized format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Unsupported color type or bit depth.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Malformed table or pattern.
    #[error("parse error: {0}")]
    Parse(String),

    /// Decoded buffer did not form a valid image.
    #[error(transparent)]
    Image(#[from] gran_core::Error),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
