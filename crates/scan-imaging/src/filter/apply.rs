//! Per-pixel filter application.

use super::kind::{FilterKind, BLACK_AND_WHITE_THRESHOLD};
use super::lut::LookupTable;
use crate::pixel::{pack_rgba, unpack_rgba, PixelImage};

/// ITU-R BT.601 luma of an RGB triple, unrounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    r as f64 * 0.299 + g as f64 * 0.587 + b as f64 * 0.114
}

/// Store a channel value the way an 8-bit clamped canvas buffer does:
/// clamp to 0..=255, round half to even.
#[inline]
fn clamp_to_byte(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Apply `filter` to every pixel of `image` in place. Alpha is never touched.
///
/// # Example
///
/// ```
/// use scan_imaging::{apply_filter, pack_rgba, FilterKind, PixelImage};
///
/// let mut image = PixelImage::from_pixels(1, 1, vec![pack_rgba(255, 0, 0, 255)]).unwrap();
/// apply_filter(&mut image, FilterKind::Grayscale);
///
/// let [r, g, b, a] = image.get_rgba(0, 0).unwrap();
/// assert_eq!((r, g, b, a), (76, 76, 76, 255));
/// ```
pub fn apply_filter(image: &mut PixelImage, filter: FilterKind) {
    match filter {
        FilterKind::Grayscale => map_pixels(image, |[r, g, b, a]| {
            let gray = clamp_to_byte(luma(r, g, b));
            [gray, gray, gray, a]
        }),
        FilterKind::BlackAndWhite => map_pixels(image, |[r, g, b, a]| {
            let bw = if luma(r, g, b) > BLACK_AND_WHITE_THRESHOLD {
                255
            } else {
                0
            };
            [bw, bw, bw, a]
        }),
        FilterKind::Enhanced | FilterKind::Document => {
            let factor = filter.contrast_factor().unwrap_or(1.0);
            apply_lookup_table(image, &LookupTable::contrast(factor));
        }
    }
}

/// Return a filtered copy of `image`.
pub fn filtered(image: &PixelImage, filter: FilterKind) -> PixelImage {
    let mut output = image.clone();
    apply_filter(&mut output, filter);
    output
}

/// Map R, G and B of every pixel through `lut`.
pub fn apply_lookup_table(image: &mut PixelImage, lut: &LookupTable) {
    map_pixels(image, |[r, g, b, a]| [lut.map(r), lut.map(g), lut.map(b), a]);
}

#[inline]
fn map_pixels(image: &mut PixelImage, f: impl Fn([u8; 4]) -> [u8; 4]) {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = f(unpack_rgba(*pixel));
        *pixel = pack_rgba(r, g, b, a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pixel: [u8; 4], filter: FilterKind) -> [u8; 4] {
        let [r, g, b, a] = pixel;
        let image = PixelImage::from_pixels(1, 1, vec![pack_rgba(r, g, b, a)]).unwrap();
        filtered(&image, filter).get_rgba(0, 0).unwrap()
    }

    #[test]
    fn test_luma_weights() {
        assert!((luma(255, 0, 0) - 76.245).abs() < 1e-9);
        assert!((luma(0, 255, 0) - 149.685).abs() < 1e-9);
        assert!((luma(0, 0, 255) - 29.07).abs() < 1e-9);
        assert!((luma(255, 255, 255) - 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_grayscale_pure_colors() {
        assert_eq!(run([255, 0, 0, 255], FilterKind::Grayscale), [76, 76, 76, 255]);
        assert_eq!(run([0, 255, 0, 255], FilterKind::Grayscale), [150, 150, 150, 255]);
        assert_eq!(run([0, 0, 255, 255], FilterKind::Grayscale), [29, 29, 29, 255]);
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        assert_eq!(run([10, 20, 30, 77], FilterKind::Grayscale)[3], 77);
    }

    #[test]
    fn test_black_and_white_threshold_is_strict() {
        // Luma of 128-grey is a hair under 128: black.
        assert_eq!(run([128, 128, 128, 255], FilterKind::BlackAndWhite), [0, 0, 0, 255]);
        assert_eq!(run([129, 129, 129, 255], FilterKind::BlackAndWhite), [255, 255, 255, 255]);
        assert_eq!(run([255, 0, 0, 9], FilterKind::BlackAndWhite), [0, 0, 0, 9]);
    }

    #[test]
    fn test_contrast_filters_use_their_tables() {
        // 1.2 * 10 + 128 = 140
        assert_eq!(run([138, 128, 0, 255], FilterKind::Enhanced), [140, 128, 0, 255]);
        // 1.4 * 10 + 128 = 142
        assert_eq!(run([138, 128, 255, 255], FilterKind::Document), [142, 128, 255, 255]);
    }

    #[test]
    fn test_filtered_leaves_source_untouched() {
        let source = PixelImage::from_pixels(1, 1, vec![pack_rgba(1, 2, 3, 4)]).unwrap();
        let _ = filtered(&source, FilterKind::Document);
        assert_eq!(source.get_rgba(0, 0), Some([1, 2, 3, 4]));
    }
}
