//! TIFF decoding.
//!
//! A single-page file decodes to a planar image. A multi-page file decodes
//! to a volumetric stack, one slice per page; every page must share the
//! first page's size.
//!
//! Supported pages: gray or RGB(A), 8/16-bit integer or 32-bit float.

use crate::{gray, Decoded, IoError, IoResult, SampleDepth};
use gran_core::Image;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

/// Reads a TIFF file as a planar image or a volumetric stack.
///
/// # Example
///
/// ```rust,ignore
/// use gran_io::tiff;
///
/// let stack = tiff::read("volume.tif")?.image;
/// println!("{} slices", stack.depth());
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    trace!(path = %path.as_ref().display(), "tiff::read");
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_err)?;

    let mut pages = Vec::new();
    let mut depth = SampleDepth::U8;
    loop {
        let (page, page_depth) = read_page(&mut decoder)?;
        pages.push(page);
        depth = depth.max(page_depth);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(decode_err)?;
    }

    debug!(pages = pages.len(), ?depth, "decoded TIFF");
    let image = if pages.len() == 1 {
        pages.remove(0)
    } else {
        Image::stack(&pages)?
    };
    Ok(Decoded { image, depth })
}

fn read_page<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> IoResult<(Image, SampleDepth)> {
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let color_type = decoder.colortype().map_err(decode_err)?;
    let result = decoder.read_image().map_err(decode_err)?;

    let channels = match color_type {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        ct => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "unsupported TIFF color type: {:?}",
                ct
            )));
        }
    };

    let (samples, depth): (Vec<f32>, _) = match result {
        DecodingResult::U8(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleDepth::U8),
        DecodingResult::U16(buf) => (buf.iter().map(|&v| v as f32).collect(), SampleDepth::U16),
        DecodingResult::F32(buf) => (buf, SampleDepth::F32),
        _ => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "unsupported TIFF sample format for {:?}",
                color_type
            )));
        }
    };

    Ok((Image::from_data(width, height, gray(&samples, channels))?, depth))
}

fn decode_err(e: tiff::TiffError) -> IoError {
    IoError::DecodeError(e.to_string())
}
