//! Gray-level image buffer.
//!
//! [`Image`] stores one scalar intensity per pixel (2D) or voxel (3D) as
//! `f32`. Source data is typically 8-bit, but any numeric range is accepted;
//! consumers that accumulate over the whole buffer widen to `f64`.
//!
//! # Memory Layout
//!
//! Voxels are stored in x-fastest order, then rows, then slices:
//!
//! ```text
//! index(x, y, z) = (z * height + y) * width + x
//! ```
//!
//! A planar image is simply a single slice with `depth() == 1` and
//! `is_3d() == false`. A one-slice stack decoded from a multi-page file still
//! reports `is_3d() == true`, so the dimensionality is explicit rather than
//! inferred from the depth.
//!
//! # Immutability
//!
//! The buffer lives behind an [`Arc`], so clones are cheap and images are never
//! mutated in place. Operators produce new images via [`Image::with_data`].
//!
//! # Usage
//!
//! ```rust
//! use gran_core::Image;
//!
//! let img = Image::filled(4, 4, 100.0);
//! assert_eq!(img.get(1, 2), 100.0);
//! assert_eq!(img.voxel_count(), 16);
//! ```

use crate::{Error, Result};
use std::sync::Arc;

/// Rec.709 luma weights used when collapsing RGB sources to gray.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Immutable gray-level image, planar or volumetric.
#[derive(Clone, PartialEq)]
pub struct Image {
    /// Intensity buffer (Arc for cheap cloning)
    data: Arc<Vec<f32>>,
    width: u32,
    height: u32,
    depth: u32,
    volumetric: bool,
}

impl Image {
    /// Creates a planar image filled with zeros.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates a planar image filled with a constant intensity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gran_core::Image;
    ///
    /// let img = Image::filled(3, 2, 7.0);
    /// assert_eq!(img.data(), &[7.0; 6]);
    /// ```
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        let count = width as usize * height as usize;
        Self {
            data: Arc::new(vec![value; count]),
            width,
            height,
            depth: 1,
            volumetric: false,
        }
    }

    /// Creates a volumetric image filled with a constant intensity.
    pub fn filled_3d(width: u32, height: u32, depth: u32, value: f32) -> Self {
        let count = width as usize * height as usize * depth as usize;
        Self {
            data: Arc::new(vec![value; count]),
            width,
            height,
            depth,
            volumetric: true,
        }
    }

    /// Creates a planar image from existing intensities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = checked_len(width, height, 1)?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                1,
                format!("expected {} elements, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            depth: 1,
            volumetric: false,
        })
    }

    /// Creates a volumetric image from existing intensities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the buffer length does not match
    /// `width * height * depth`.
    pub fn from_data_3d(width: u32, height: u32, depth: u32, data: Vec<f32>) -> Result<Self> {
        let expected = checked_len(width, height, depth)?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                depth,
                format!("expected {} elements, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            depth,
            volumetric: true,
        })
    }

    /// Stacks planar images of identical size into a volumetric image.
    ///
    /// # Errors
    ///
    /// Fails if `planes` is empty, if any plane is itself volumetric, or if
    /// plane sizes differ.
    pub fn stack(planes: &[Image]) -> Result<Self> {
        let first = planes
            .first()
            .ok_or_else(|| Error::invalid_dimensions(0, 0, 0, "no planes to stack"))?;
        let (w, h) = (first.width, first.height);
        let mut data = Vec::with_capacity(first.data.len() * planes.len());
        for plane in planes {
            if plane.volumetric {
                return Err(Error::invalid_dimensions(
                    plane.width,
                    plane.height,
                    plane.depth,
                    "cannot stack volumetric images",
                ));
            }
            if plane.width != w || plane.height != h {
                return Err(Error::dimension_mismatch(first.dims(), plane.dims()));
            }
            data.extend_from_slice(&plane.data);
        }
        Self::from_data_3d(w, h, planes.len() as u32, data)
    }

    /// Returns a new image of the same shape holding `data`.
    ///
    /// This is how operators produce their output: the source is never
    /// modified.
    pub fn with_data(&self, data: Vec<f32>) -> Result<Self> {
        if data.len() != self.data.len() {
            return Err(Error::invalid_dimensions(
                self.width,
                self.height,
                self.depth,
                format!("expected {} elements, got {}", self.data.len(), data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width: self.width,
            height: self.height,
            depth: self.depth,
            volumetric: self.volumetric,
        })
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of slices (1 for planar images).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `true` for volumetric images.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.volumetric
    }

    /// Returns `(width, height, depth)`.
    #[inline]
    pub fn dims(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    /// Returns `true` if both images have the same shape and dimensionality.
    #[inline]
    pub fn same_shape(&self, other: &Image) -> bool {
        self.dims() == other.dims() && self.volumetric == other.volumetric
    }

    /// Returns the total number of pixels or voxels.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image has zero extent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the raw intensity buffer.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32, z: u32) -> usize {
        (z as usize * self.height as usize + y as usize) * self.width as usize + x as usize
    }

    /// Returns the intensity at (x, y) of the first slice.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.get3(x, y, 0)
    }

    /// Returns the intensity at (x, y, z).
    ///
    /// # Panics
    ///
    /// Panics if (x, y, z) is out of bounds.
    #[inline]
    pub fn get3(&self, x: u32, y: u32, z: u32) -> f32 {
        debug_assert!(
            x < self.width && y < self.height && z < self.depth,
            "voxel out of bounds"
        );
        self.data[self.offset(x, y, z)]
    }

    /// Returns the intensity at (x, y, z), or an error if out of bounds.
    pub fn try_get3(&self, x: u32, y: u32, z: u32) -> Result<f32> {
        if x < self.width && y < self.height && z < self.depth {
            Ok(self.data[self.offset(x, y, z)])
        } else {
            Err(Error::out_of_bounds(
                x,
                y,
                z,
                self.width,
                self.height,
                self.depth,
            ))
        }
    }

    /// Returns the intensity at (x, y, z) widened to `f64`.
    #[inline]
    pub fn intensity(&self, x: u32, y: u32, z: u32) -> f64 {
        self.get3(x, y, z) as f64
    }

    /// Returns row `y` of slice `z`.
    #[inline]
    pub fn row(&self, y: u32, z: u32) -> &[f32] {
        let start = self.offset(0, y, z);
        &self.data[start..start + self.width as usize]
    }

    /// Iterates over the rows of every slice, slice-major.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        // chunks_exact panics on zero; an empty image has no rows anyway
        let width = (self.width as usize).max(1);
        self.data.chunks_exact(width)
    }

    /// Returns a new image with `f` applied to every intensity.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            data: Arc::new(self.data.iter().map(|&v| f(v)).collect()),
            ..self.clone()
        }
    }

    /// Returns `(min, max)` intensities, or `None` for an empty image.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Rescales intensities linearly so that min maps to 0 and max to 255,
    /// rounding to whole gray levels.
    ///
    /// Integer-valued ranges of at least one level use the `256 / (range + 1)`
    /// bucket scale; narrower (float) ranges are stretched by `255 / range`.
    /// A constant image maps to 0.
    pub fn to_byte_range(&self) -> Self {
        let Some((lo, hi)) = self.min_max() else {
            return self.clone();
        };
        let range = hi - lo;
        if range <= 0.0 {
            return self.map(|_| 0.0);
        }
        let scale = if range >= 1.0 {
            256.0 / (range + 1.0)
        } else {
            255.0 / range
        };
        self.map(|v| ((v - lo) * scale + 0.5).floor().clamp(0.0, 255.0))
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .field("is_3d", &self.volumetric)
            .finish()
    }
}

fn checked_len(width: u32, height: u32, depth: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(depth as usize))
        .ok_or_else(|| Error::invalid_dimensions(width, height, depth, "size overflows usize"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_image_filled() {
        let img = Image::filled(4, 3, 2.5);
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 3);
        assert_eq!(img.depth(), 1);
        assert!(!img.is_3d());
        assert_eq!(img.voxel_count(), 12);
        assert_eq!(img.get(3, 2), 2.5);
    }

    #[test]
    fn test_image_from_data_layout() {
        let data: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let img = Image::from_data(3, 2, data).unwrap();
        assert_eq!(img.get(0, 0), 0.0);
        assert_eq!(img.get(2, 0), 2.0);
        assert_eq!(img.get(0, 1), 3.0);
        assert_eq!(img.row(1, 0), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_image_from_data_wrong_size() {
        let result = Image::from_data(10, 10, vec![0.0; 99]);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_image_3d_layout() {
        let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let img = Image::from_data_3d(2, 2, 2, data).unwrap();
        assert!(img.is_3d());
        assert_eq!(img.get3(1, 1, 0), 3.0);
        assert_eq!(img.get3(0, 0, 1), 4.0);
        assert_eq!(img.rows().count(), 4);
    }

    #[test]
    fn test_try_get3_out_of_bounds() {
        let img = Image::new(2, 2);
        assert!(img.try_get3(0, 1, 0).is_ok());
        let err = img.try_get3(2, 0, 0).unwrap_err();
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_stack() {
        let a = Image::filled(2, 2, 1.0);
        let b = Image::filled(2, 2, 2.0);
        let stack = Image::stack(&[a, b]).unwrap();
        assert!(stack.is_3d());
        assert_eq!(stack.dims(), (2, 2, 2));
        assert_eq!(stack.get3(1, 1, 1), 2.0);
    }

    #[test]
    fn test_stack_mismatch() {
        let a = Image::filled(2, 2, 1.0);
        let b = Image::filled(3, 2, 2.0);
        assert!(matches!(
            Image::stack(&[a, b]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Image::stack(&[]),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_with_data_keeps_shape() {
        let src = Image::filled_3d(2, 2, 2, 1.0);
        let out = src.with_data(vec![5.0; 8]).unwrap();
        assert!(out.same_shape(&src));
        assert_eq!(src.get3(0, 0, 0), 1.0);
        assert!(src.with_data(vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_min_max() {
        let img = Image::from_data(3, 1, vec![4.0, -1.0, 9.0]).unwrap();
        assert_eq!(img.min_max(), Some((-1.0, 9.0)));
        assert_eq!(Image::new(0, 0).min_max(), None);
    }

    #[test]
    fn test_to_byte_range() {
        let img = Image::from_data(3, 1, vec![1000.0, 2000.0, 3000.0]).unwrap();
        let bytes = img.to_byte_range();
        let (lo, hi) = bytes.min_max().unwrap();
        assert_abs_diff_eq!(lo, 0.0);
        assert!(hi <= 255.0 && hi >= 254.0);

        let flat = Image::filled(2, 2, 42.0).to_byte_range();
        assert_eq!(flat.data(), &[0.0; 4]);
    }
}
