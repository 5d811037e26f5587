//! Image encoding: `DynamicImage` → JPEG bytes.
//!
//! JPEG has no alpha channel and pdfium hands back RGBA bitmaps, so every
//! page is flattened to RGB before it reaches the codec.

use crate::config::QUALITY_RANGE;
use crate::error::EncodeError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Turns a rendered page into encoded bytes at a given quality.
pub trait PageEncoder {
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError>;
}

impl<E: PageEncoder + ?Sized> PageEncoder for &E {
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        (**self).encode(image, quality)
    }
}

/// The default [`PageEncoder`]: baseline JPEG via the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegPageEncoder;

impl PageEncoder for JpegPageEncoder {
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        encode_jpeg(image, quality)
    }
}

/// Encode `img` as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if !QUALITY_RANGE.contains(&quality) {
        return Err(EncodeError::InvalidQuality(quality));
    }
    if img.width() == 0 || img.height() == 0 {
        return Err(EncodeError::EmptyImage {
            width: img.width(),
            height: img.height(),
        });
    }

    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;

    debug!(
        "Encoded {}x{} page → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}
