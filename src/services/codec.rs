//! Image file decoding and encoding.
//!
//! Jobs work on [`PixelImage`] buffers; the codec sits at the edges, turning
//! uploaded JPEG or PNG bytes into RGBA pixels and the result back into a
//! file in the configured output format.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use scan_imaging::PixelImage;
use std::sync::Arc;

use crate::error::JobError;
use crate::models::OutputFormat;

/// Turns encoded image files into pixel buffers and back.
pub trait ImageCodec: Send + Sync {
    /// Decode any supported raster format to RGBA.
    fn decode(&self, bytes: &[u8]) -> Result<PixelImage, JobError>;

    /// Encode to `format`. `quality` only applies to JPEG.
    fn encode(
        &self,
        image: &PixelImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, JobError>;
}

pub type DynImageCodec = Arc<dyn ImageCodec>;

/// [`ImageCodec`] backed by the `image` crate (JPEG and PNG).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PixelImage, JobError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| JobError::Decode(format!("Failed to decode image: {e}")))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();

        PixelImage::from_rgba_bytes(width, height, decoded.as_raw())
            .map_err(|e| JobError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        image: &PixelImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, JobError> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = image.to_rgb_bytes();
                JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                    .write_image(&rgb, image.width(), image.height(), ExtendedColorType::Rgb8)
                    .map_err(|e| JobError::Encode(format!("JPEG encode failed: {e}")))?;
            }
            OutputFormat::Png => {
                let rgba = image.to_rgba_bytes();
                PngEncoder::new(&mut buffer)
                    .write_image(&rgba, image.width(), image.height(), ExtendedColorType::Rgba8)
                    .map_err(|e| JobError::Encode(format!("PNG encode failed: {e}")))?;
            }
        }
        Ok(buffer)
    }
}
