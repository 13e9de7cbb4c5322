//! Flat packed-RGBA pixel buffer.
//!
//! [`PixelImage`] stores one `u32` per pixel in row-major order. The four
//! channel bytes sit in memory order `[R, G, B, A]`, i.e. a pixel is
//! `u32::from_le_bytes([r, g, b, a])`. A zero word is transparent black and
//! is the value every pixel starts with.

use crate::error::PixelBufferError;

/// Pack four channel bytes into a pixel word.
#[inline]
pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_le_bytes([r, g, b, a])
}

/// Split a pixel word into its `[R, G, B, A]` bytes.
#[inline]
pub fn unpack_rgba(pixel: u32) -> [u8; 4] {
    pixel.to_le_bytes()
}

/// A decoded image as a width x height array of packed RGBA words.
///
/// The invariant `pixels.len() == width * height` is checked by every
/// constructor, so indexing through [`get`](PixelImage::get) and
/// [`set`](PixelImage::set) only has to check coordinates.
///
/// # Example
///
/// ```
/// use scan_imaging::{pack_rgba, PixelImage};
///
/// let mut image = PixelImage::new(2, 2);
/// assert_eq!(image.get(1, 1), Some(0));
///
/// image.set(1, 1, pack_rgba(255, 0, 0, 255)).unwrap();
/// assert_eq!(image.get_rgba(1, 1), Some([255, 0, 0, 255]));
/// assert_eq!(image.get(2, 0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelImage {
    /// Create a zero-filled (transparent black) image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap an existing buffer of packed pixels.
    ///
    /// Fails with [`PixelBufferError::LengthMismatch`] when the buffer does
    /// not hold exactly `width * height` words.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, PixelBufferError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image from interleaved RGBA bytes (4 bytes per pixel).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, PixelBufferError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| pack_rgba(px[0], px[1], px[2], px[3]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Interleaved RGBA bytes, `width * height * 4` long.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &pixel in &self.pixels {
            bytes.extend_from_slice(&unpack_rgba(pixel));
        }
        bytes
    }

    /// Interleaved RGB bytes with alpha dropped, `width * height * 3` long.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for &pixel in &self.pixels {
            let [r, g, b, _] = unpack_rgba(pixel);
            bytes.extend_from_slice(&[r, g, b]);
        }
        bytes
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major packed pixels.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Whether `(x, y)` addresses a pixel of this image.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// Channel bytes of the pixel at `(x, y)`.
    #[inline]
    pub fn get_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.get(x, y).map(unpack_rgba)
    }

    /// Overwrite the pixel at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) -> Result<(), PixelBufferError> {
        if x >= self.width || y >= self.height {
            return Err(PixelBufferError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let index = self.index(x, y);
        self.pixels[index] = pixel;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent_black() {
        let image = PixelImage::new(3, 2);
        assert_eq!(image.pixels().len(), 6);
        assert!(image.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_pack_channel_order() {
        let pixel = pack_rgba(1, 2, 3, 4);
        assert_eq!(pixel.to_le_bytes(), [1, 2, 3, 4]);
        assert_eq!(unpack_rgba(pixel), [1, 2, 3, 4]);
    }

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        let err = PixelImage::from_pixels(2, 2, vec![0; 3]).unwrap_err();
        assert_eq!(
            err,
            PixelBufferError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_from_rgba_bytes_layout() {
        let bytes = [10, 20, 30, 255, 40, 50, 60, 128];
        let image = PixelImage::from_rgba_bytes(2, 1, &bytes).unwrap();

        assert_eq!(image.get_rgba(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(image.get_rgba(1, 0), Some([40, 50, 60, 128]));
        assert_eq!(image.to_rgba_bytes(), bytes.to_vec());
        assert_eq!(image.to_rgb_bytes(), vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_from_rgba_bytes_rejects_partial_pixel() {
        assert!(PixelImage::from_rgba_bytes(1, 1, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_get_and_set_are_bounds_checked() {
        let mut image = PixelImage::new(2, 3);

        assert!(image.set(1, 2, 7).is_ok());
        assert_eq!(image.get(1, 2), Some(7));
        assert_eq!(image.pixels()[5], 7);

        assert_eq!(image.get(2, 0), None);
        assert_eq!(image.get(0, 3), None);
        assert!(matches!(
            image.set(2, 0, 1),
            Err(PixelBufferError::OutOfBounds { x: 2, y: 0, .. })
        ));
    }

    #[test]
    fn test_contains_handles_negative_coordinates() {
        let image = PixelImage::new(4, 4);
        assert!(image.contains(0, 0));
        assert!(image.contains(3, 3));
        assert!(!image.contains(-1, 0));
        assert!(!image.contains(0, 4));
    }
}
