//! Gray-level morphology with flat structuring elements.
//!
//! Provides the four operators used to build granulometry curves:
//!
//! - [`erode`] - minimum over the element, shrinks bright structures
//! - [`dilate`] - maximum over the reflected element, grows bright structures
//! - [`open`] - erosion followed by dilation, removes bright details
//! - [`close`] - dilation followed by erosion, fills dark details
//!
//! Neighbors that fall outside the image are ignored rather than padded, so
//! a constant image is left unchanged by every operator.
//!
//! The [`Morphology`] trait is the seam the granulometry pipeline depends on;
//! [`FlatMorphology`] is the implementation backed by this module.
//!
//! # Example
//!
//! ```rust
//! use gran_core::Image;
//! use gran_ops::morphology::{dilate, Operation};
//! use gran_ops::strel::{Shape, Strel};
//!
//! let mut data = vec![0.0f32; 9];
//! data[4] = 1.0;
//! let img = Image::from_data(3, 3, data).unwrap();
//! let se = Strel::from_radius(Shape::Square, 1).unwrap();
//! let out = dilate(&img, &se).unwrap();
//! assert!(out.data().iter().all(|&v| v == 1.0));
//! assert_eq!(Operation::Dilation.apply(&img, &se).unwrap(), out);
//! ```

use crate::strel::{Shape, SizeKind, Strel};
use crate::{OpsError, OpsResult};
use gran_core::Image;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Morphological operator applied at each granulometry step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Morphological erosion.
    Erosion,
    /// Morphological dilation.
    Dilation,
    /// Morphological opening.
    Opening,
    /// Morphological closing.
    Closing,
}

impl Operation {
    /// All operations, in display order.
    pub const ALL: [Operation; 4] = [
        Operation::Erosion,
        Operation::Dilation,
        Operation::Closing,
        Operation::Opening,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Erosion => "Erosion",
            Operation::Dilation => "Dilation",
            Operation::Opening => "Opening",
            Operation::Closing => "Closing",
        }
    }

    /// Labels of all operations.
    pub fn all_labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|o| o.label()).collect()
    }

    /// Returns `true` if the operator never increases intensities.
    pub fn is_anti_extensive(self) -> bool {
        matches!(self, Operation::Erosion | Operation::Opening)
    }

    /// Applies the operator with the given element.
    pub fn apply(self, image: &Image, strel: &Strel) -> OpsResult<Image> {
        match self {
            Operation::Erosion => erode(image, strel),
            Operation::Dilation => dilate(image, strel),
            Operation::Opening => open(image, strel),
            Operation::Closing => close(image, strel),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "erosion" | "erode" => Ok(Operation::Erosion),
            "dilation" | "dilate" => Ok(Operation::Dilation),
            "opening" | "open" => Ok(Operation::Opening),
            "closing" | "close" => Ok(Operation::Closing),
            _ => Err(OpsError::UnknownLabel {
                kind: "operation",
                label: s.to_string(),
            }),
        }
    }
}

/// Morphology capability consumed by the granulometry pipeline.
///
/// Implementations build an element for a (shape, size, kind) triple and
/// apply one of the four operators with it, returning a new image of the
/// same shape.
pub trait Morphology: Send + Sync {
    /// Opaque structuring element type.
    type Element: Send + Sync;

    /// Builds the structuring element.
    fn structuring_element(&self, shape: Shape, size: u32, kind: SizeKind)
        -> OpsResult<Self::Element>;

    /// Applies `op` to `image` with `element`.
    fn apply(&self, image: &Image, op: Operation, element: &Self::Element) -> OpsResult<Image>;
}

/// Flat-element morphology computed directly over the element offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatMorphology;

impl Morphology for FlatMorphology {
    type Element = Strel;

    fn structuring_element(&self, shape: Shape, size: u32, kind: SizeKind) -> OpsResult<Strel> {
        Strel::new(shape, size, kind)
    }

    fn apply(&self, image: &Image, op: Operation, element: &Strel) -> OpsResult<Image> {
        op.apply(image, element)
    }
}

/// Morphological erosion: each output value is the minimum of the input
/// over the element placed at that position.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] for a volumetric element on a
/// planar image.
pub fn erode(image: &Image, strel: &Strel) -> OpsResult<Image> {
    rank_filter(image, strel, false)
}

/// Morphological dilation: maximum over the reflected element.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] for a volumetric element on a
/// planar image.
pub fn dilate(image: &Image, strel: &Strel) -> OpsResult<Image> {
    rank_filter(image, strel, true)
}

/// Morphological opening - erosion followed by dilation.
///
/// Removes bright structures smaller than the element.
pub fn open(image: &Image, strel: &Strel) -> OpsResult<Image> {
    let eroded = erode(image, strel)?;
    dilate(&eroded, strel)
}

/// Morphological closing - dilation followed by erosion.
///
/// Fills dark structures smaller than the element.
pub fn close(image: &Image, strel: &Strel) -> OpsResult<Image> {
    let dilated = dilate(image, strel)?;
    erode(&dilated, strel)
}

/// Internal min/max filter over the element offsets.
fn rank_filter(image: &Image, strel: &Strel, is_dilate: bool) -> OpsResult<Image> {
    if strel.is_3d() && !image.is_3d() {
        return Err(OpsError::InvalidParameter(format!(
            "{} element requires a 3D image",
            strel.shape()
        )));
    }
    trace!(
        dims = ?image.dims(),
        shape = %strel.shape(),
        size = strel.size(),
        cells = strel.len(),
        is_dilate,
        "rank_filter"
    );
    if image.is_empty() {
        return Ok(image.clone());
    }

    let (width, height, depth) = image.dims();
    let ctx = FilterContext {
        src: image.data(),
        width: width as i64,
        height: height as i64,
        depth: depth as i64,
        // dilation uses the reflected element
        sign: if is_dilate { -1 } else { 1 },
        offsets: strel.offsets(),
        is_dilate,
    };

    let mut dst = vec![0.0f32; image.voxel_count()];

    #[cfg(feature = "parallel")]
    dst.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(r, row)| ctx.filter_row(r, row));

    #[cfg(not(feature = "parallel"))]
    dst.chunks_mut(width as usize)
        .enumerate()
        .for_each(|(r, row)| ctx.filter_row(r, row));

    Ok(image.with_data(dst)?)
}

struct FilterContext<'a> {
    src: &'a [f32],
    width: i64,
    height: i64,
    depth: i64,
    sign: i64,
    offsets: &'a [[i32; 3]],
    is_dilate: bool,
}

impl FilterContext<'_> {
    /// Fills output row `r` (slice-major row index).
    fn filter_row(&self, r: usize, row: &mut [f32]) {
        let y = r as i64 % self.height;
        let z = r as i64 / self.height;

        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            let mut val = if self.is_dilate {
                f32::NEG_INFINITY
            } else {
                f32::INFINITY
            };

            for off in self.offsets {
                let sx = x + self.sign * off[0] as i64;
                let sy = y + self.sign * off[1] as i64;
                let sz = z + self.sign * off[2] as i64;
                if sx < 0 || sy < 0 || sz < 0 || sx >= self.width || sy >= self.height || sz >= self.depth {
                    continue;
                }
                let v = self.src[((sz * self.height + sy) * self.width + sx) as usize];
                val = if self.is_dilate { val.max(v) } else { val.min(v) };
            }

            *out = val;
        }
    }
}
