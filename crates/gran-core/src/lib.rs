//! # gran-core
//!
//! Core types shared by the granulometry crates.
//!
//! - [`Image`] - Immutable gray-level image, planar (2D) or volumetric (3D)
//! - [`Error`] / [`Result`] - Buffer construction and bounds errors
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. Everything else builds on it:
//!
//! ```text
//! gran-core (this crate)
//!    ^
//!    |
//!    +-- gran-ops (structuring elements, morphology, enhancement)
//!    +-- gran-io (decoding, listing, table export)
//!    +-- gran-analysis (volume curves, granulometry, statistics)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;

pub use error::{Error, Result};
pub use image::{Image, REC709_LUMA};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
}
