//! Error types for gran-core operations.
//!
//! Covers failures that can occur while building or addressing an
//! [`Image`](crate::Image) buffer. Higher-level crates wrap this enum in
//! their own error types.
//!
//! # Usage
//!
//! ```rust
//! use gran_core::{Error, Result};
//!
//! fn check(x: u32, y: u32, width: u32, height: u32) -> Result<()> {
//!     if x >= width || y >= height {
//!         return Err(Error::out_of_bounds(x, y, 0, width, height, 1));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or addressing images.
#[derive(Debug, Error)]
pub enum Error {
    /// Voxel coordinates are outside image bounds.
    #[error("voxel ({x}, {y}, {z}) out of bounds for image {width}x{height}x{depth}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Z coordinate that was out of bounds
        z: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Image depth (1 for planar images)
        depth: u32,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when a dimension is zero, when the buffer length does not
    /// match the requested size, or when the size overflows `usize`.
    #[error("invalid dimensions: {width}x{height}x{depth} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Requested depth
        depth: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Two images that must share a shape do not.
    #[error("dimension mismatch: {a:?} vs {b:?}")]
    DimensionMismatch {
        /// First shape (width, height, depth)
        a: (u32, u32, u32),
        /// Second shape (width, height, depth)
        b: (u32, u32, u32),
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, z: u32, width: u32, height: u32, depth: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            z,
            width,
            height,
            depth,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(
        width: u32,
        height: u32,
        depth: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            depth,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32, u32), b: (u32, u32, u32)) -> Self {
        Self::DimensionMismatch { a, b }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 0, 80, 60, 1);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("80x60x1"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Error::invalid_dimensions(0, 10, 1, "zero width");
        assert!(err.to_string().contains("zero width"));
        assert!(!err.is_bounds_error());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((4, 4, 1), (8, 8, 1));
        let msg = err.to_string();
        assert!(msg.contains("(4, 4, 1)"));
        assert!(msg.contains("(8, 8, 1)"));
    }
}
