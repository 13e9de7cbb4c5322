//! Test fixtures and constants.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use docscan::models::OutputFormat;
use docscan::services::{ImageCodec, ImageCrateCodec};
use scan_imaging::{pack_rgba, PixelImage};

/// Test correlation ids
pub mod ids {
    pub const PERSPECTIVE_JOB: &str = "scan-0001";
    pub const FILTER_JOB: &str = "scan-0002";
    pub const UNKNOWN_JOB: &str = "scan-9999";
}

/// Deterministic, non-uniform opaque pattern
pub fn pattern(width: u32, height: u32) -> PixelImage {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| pack_rgba((x * 3) as u8, (y * 5) as u8, (x ^ y) as u8, 255))
        })
        .collect();
    PixelImage::from_pixels(width, height, pixels).unwrap()
}

/// Single-colour opaque image
pub fn solid(width: u32, height: u32, [r, g, b]: [u8; 3]) -> PixelImage {
    PixelImage::from_pixels(
        width,
        height,
        vec![pack_rgba(r, g, b, 255); (width * height) as usize],
    )
    .unwrap()
}

/// Encode as PNG
pub fn png(image: &PixelImage) -> Vec<u8> {
    ImageCrateCodec::new()
        .encode(image, OutputFormat::Png, 85)
        .unwrap()
}

/// Decode result bytes of a job
pub fn decode(bytes: &[u8]) -> PixelImage {
    ImageCrateCodec::new().decode(bytes).unwrap()
}

pub fn base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Full-image corners in wire form
pub fn full_corners() -> serde_json::Value {
    serde_json::json!([
        {"dx": 0.0, "dy": 0.0},
        {"dx": 1.0, "dy": 0.0},
        {"dx": 1.0, "dy": 1.0},
        {"dx": 0.0, "dy": 1.0}
    ])
}
