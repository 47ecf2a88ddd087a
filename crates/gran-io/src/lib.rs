//! # gran-io
//!
//! Input and output for granulometry runs.
//!
//! - [`read`] - decode a PNG or TIFF file into a gray [`Image`] tagged with
//!   its [`SampleDepth`]
//! - [`listing`] - find the images of a directory or glob pattern
//! - [`table`] - tab-separated result tables
//! - [`summary`] - plain-text run summary and result file names
//!
//! Decoded intensities keep their native range: 8-bit sources give 0-255,
//! 16-bit sources 0-65535. Color sources are collapsed to Rec.709 luma.
//!
//! # Example
//!
//! ```rust,ignore
//! use gran_io::{list_images, read};
//!
//! for path in list_images("scans/")? {
//!     let decoded = read(&path)?;
//!     println!("{}: {:?} {:?}", path.display(), decoded.image.dims(), decoded.depth);
//! }
//! ```
//!
//! # Features
//!
//! - `png` (default) - PNG decoding
//! - `tiff` (default) - TIFF decoding, multi-page files become 3D stacks

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod detect;
pub mod listing;
pub mod summary;
pub mod table;

#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use listing::{glob_images, list_images};
pub use summary::RunSummary;
pub use table::{Table, TableRow};

use gran_core::{Image, REC709_LUMA};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Sample type a file was stored with.
///
/// Ordered by width, so the widest page of a stack wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleDepth {
    /// 8-bit integer samples (including expanded palette and sub-byte gray).
    U8,
    /// 16-bit integer samples.
    U16,
    /// 32-bit float samples.
    F32,
}

/// A decoded gray image and the sample type of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Gray intensities in the source's native range.
    pub image: Image,
    /// Sample type before decoding.
    pub depth: SampleDepth,
}

/// Decodes an image file, detecting the format from its content.
///
/// # Errors
///
/// - [`IoError::Io`] if the file cannot be opened
/// - [`IoError::UnsupportedFormat`] for formats without a decoder
/// - [`IoError::DecodeError`] for corrupt files
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    trace!(path = %path.display(), ?format, "read");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),
        #[cfg(feature = "tiff")]
        Format::Tiff => tiff::read(path),
        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Collapses interleaved samples to one gray value per pixel.
///
/// One or two channels keep the first (gray, alpha dropped); three or more
/// apply luma weights to the first three.
#[allow(dead_code)]
pub(crate) fn gray(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 | 1 => samples.to_vec(),
        2 => samples.chunks_exact(2).map(|c| c[0]).collect(),
        n => samples
            .chunks_exact(n)
            .map(|c| REC709_LUMA[0] * c[0] + REC709_LUMA[1] * c[1] + REC709_LUMA[2] * c[2])
            .collect(),
    }
}
