//! Pixel buffer abstraction.

mod pixel_image;

pub use pixel_image::{pack_rgba, unpack_rgba, PixelImage};
