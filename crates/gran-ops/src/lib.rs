//! # gran-ops
//!
//! Image operators used to build granulometry curves.
//!
//! # Modules
//!
//! - [`strel`] - Flat structuring elements (disk, square, lines, ball, ...)
//! - [`morphology`] - Erosion, dilation, opening and closing
//! - [`enhance`] - Contrast normalization and histogram equalization
//!
//! # Example
//!
//! ```rust
//! use gran_core::Image;
//! use gran_ops::{Morphology, FlatMorphology, Operation, Shape, SizeKind};
//!
//! let img = Image::filled(16, 16, 10.0);
//! let backend = FlatMorphology;
//! let se = backend.structuring_element(Shape::Disk, 5, SizeKind::Diameter)?;
//! let opened = backend.apply(&img, Operation::Opening, &se)?;
//! assert_eq!(opened, img);
//! # Ok::<(), gran_ops::OpsError>(())
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - row-parallel morphology via rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod enhance;
pub mod morphology;
pub mod strel;

pub use enhance::Enhancement;
pub use error::{OpsError, OpsResult};
pub use morphology::{FlatMorphology, Morphology, Operation};
pub use strel::{Shape, SizeKind, Strel};
