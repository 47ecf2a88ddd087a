//! Image volume: the sum of all intensities.

use gran_core::Image;

/// Sums every pixel or voxel intensity of `image`.
///
/// Accumulates in `f64` row by row, so large 8-bit and 16-bit images stay
/// exact far beyond the `f32` mantissa.
///
/// ```rust
/// use gran_analysis::measure_volume;
/// use gran_core::Image;
///
/// assert_eq!(measure_volume(&Image::filled(4, 4, 100.0)), 1600.0);
/// ```
pub fn measure_volume(image: &Image) -> f64 {
    image
        .rows()
        .map(|row| row.iter().map(|&v| v as f64).sum::<f64>())
        .sum()
}
