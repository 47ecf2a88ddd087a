//! PNG decoding.
//!
//! Gray and RGB(A) images at 8 or 16 bits. Palette and sub-byte gray
//! images are expanded by the decoder. Color is collapsed to luma and alpha
//! is dropped; intensities keep their native range (0-255 or 0-65535).

use crate::{gray, Decoded, IoError, IoResult, SampleDepth};
use gran_core::Image;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Reads a PNG file as a planar gray image.
///
/// # Example
///
/// ```rust,ignore
/// use gran_io::png;
///
/// let image = png::read("grains.png")?.image;
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Decoded> {
    trace!(path = %path.as_ref().display(), "png::read");
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                other, info.bit_depth
            )));
        }
    };

    let (samples, depth): (Vec<f32>, _) = match info.bit_depth {
        png::BitDepth::Eight => (bytes.iter().map(|&v| v as f32).collect(), SampleDepth::U8),
        png::BitDepth::Sixteen => (
            bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32)
                .collect(),
            SampleDepth::U16,
        ),
        other => {
            return Err(IoError::UnsupportedBitDepth(format!("{:?}", other)));
        }
    };

    let data = gray(&samples, channels);
    debug!(
        width = info.width,
        height = info.height,
        channels,
        ?depth,
        "decoded PNG"
    );
    Ok(Decoded {
        image: Image::from_data(info.width, info.height, data)?,
        depth,
    })
}
