//! Poster normalization
//!
//! Recompresses a downloaded poster to plain baseline JPEG at a configured
//! quality. Decoding sniffs the actual content format (catalog assets are
//! served with a `.jpg` name regardless of what they contain), conversion
//! to 8-bit RGB drops any alpha channel, and the re-encode leaves XMP and
//! other extended metadata blocks behind.
//!
//! Failure here is part of the contract: the applier falls back to the
//! un-normalized download.

use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::path::Path;

use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// Errors that can occur while normalizing a poster.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The downloaded file could not be decoded as an image
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the input or writing the output failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Recompresses `input` into `output` as RGB JPEG at `quality` (1-100).
pub(crate) fn compress_image(
    input: &Path,
    output: &Path,
    quality: u8,
) -> Result<(), CompressError> {
    let decoded = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    let rgb = decoded.into_rgb8();

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder.encode_image(&rgb)?;
    Ok(())
}
