//! Quadrilateral-to-rectangle resampling.
//!
//! For every output row the left and right source edges are interpolated
//! linearly between the quad's top and bottom corners; every output column
//! then interpolates linearly between those two edge points and copies the
//! nearest source pixel. Source pixels are never blended.
//!
//! The output grid is walked in square tiles for cache locality. Tiling is
//! only a traversal order; the value of every output pixel depends on its
//! own coordinates alone.

use std::sync::atomic::{AtomicBool, Ordering};

use super::corner::{round_half_up, PixelPoint, PixelQuad, Quad};
use crate::error::ResampleError;
use crate::pixel::PixelImage;

/// Edge length of the square output tiles.
pub const TILE_SIZE: u32 = 128;

/// Source-space endpoints of one output row.
#[derive(Debug, Clone, Copy)]
struct RowSpan {
    left: PixelPoint,
    delta_x: f64,
    delta_y: f64,
    /// Every sample of this row rounds to a pixel inside the source.
    in_bounds: bool,
}

impl RowSpan {
    fn new(quad: &PixelQuad, v: f64, source_width: u32, source_height: u32) -> Self {
        let left = quad.top_left.lerp(quad.bottom_left, v);
        let right = quad.top_right.lerp(quad.bottom_right, v);

        // Samples lie between left and right. Requiring the far end to stay
        // a whole pixel inside keeps the rounded index in range without a
        // per-sample check; rows that miss this fall back to checking each
        // sample and still produce the same pixels.
        let in_bounds = left.x.min(right.x) >= 0.0
            && left.y.min(right.y) >= 0.0
            && left.x.max(right.x) < source_width as f64 - 1.0
            && left.y.max(right.y) < source_height as f64 - 1.0;

        Self {
            left,
            delta_x: right.x - left.x,
            delta_y: right.y - left.y,
            in_bounds,
        }
    }
}

/// Unwarp the region described by `quad` into a new rectangular image.
///
/// The output size is the rounded bounding box of the corners in source
/// pixels. Output pixels whose sample falls outside the source stay
/// transparent black.
///
/// # Example
///
/// ```
/// use scan_imaging::{resample, NormalizedCorner, PixelImage, Quad};
///
/// let source = PixelImage::new(200, 200);
/// let quad = Quad::new(
///     NormalizedCorner::new(0.25, 0.25),
///     NormalizedCorner::new(0.5, 0.25),
///     NormalizedCorner::new(0.5, 0.5),
///     NormalizedCorner::new(0.25, 0.5),
/// );
///
/// let output = resample(&source, &quad).unwrap();
/// assert_eq!((output.width(), output.height()), (50, 50));
/// ```
pub fn resample(source: &PixelImage, quad: &Quad) -> Result<PixelImage, ResampleError> {
    resample_in_tiles(source, quad, TILE_SIZE, None)
}

/// Like [`resample`], checking `cancel` before each band of tiles.
///
/// Returns [`ResampleError::Cancelled`] once the flag is observed set.
pub fn resample_with_cancel(
    source: &PixelImage,
    quad: &Quad,
    cancel: &AtomicBool,
) -> Result<PixelImage, ResampleError> {
    resample_in_tiles(source, quad, TILE_SIZE, Some(cancel))
}

pub(crate) fn resample_in_tiles(
    source: &PixelImage,
    quad: &Quad,
    tile_size: u32,
    cancel: Option<&AtomicBool>,
) -> Result<PixelImage, ResampleError> {
    let source_width = source.width();
    let source_height = source.height();
    let corners = quad.to_pixels(source_width, source_height);
    let (output_width, output_height) = corners.output_size()?;

    let inv_width = 1.0 / output_width as f64;
    let inv_height = 1.0 / output_height as f64;

    let spans: Vec<RowSpan> = (0..output_height)
        .map(|y| RowSpan::new(&corners, y as f64 * inv_height, source_width, source_height))
        .collect();

    let src = source.pixels();
    let src_stride = source_width as usize;
    let src_w = source_width as f64;
    let src_h = source_height as f64;

    let mut output = PixelImage::new(output_width, output_height);
    let out_stride = output_width as usize;
    let dst = output.pixels_mut();

    let tile = tile_size.max(1);

    for y_chunk in (0..output_height).step_by(tile as usize) {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(ResampleError::Cancelled);
        }
        let y_end = y_chunk.saturating_add(tile).min(output_height);

        for x_chunk in (0..output_width).step_by(tile as usize) {
            let x_end = x_chunk.saturating_add(tile).min(output_width);

            for y in y_chunk..y_end {
                let span = spans[y as usize];
                let row = y as usize * out_stride;

                for x in x_chunk..x_end {
                    let u = x as f64 * inv_width;
                    let src_x = round_half_up(span.left.x + span.delta_x * u);
                    let src_y = round_half_up(span.left.y + span.delta_y * u);

                    if span.in_bounds
                        || (src_x >= 0.0 && src_x < src_w && src_y >= 0.0 && src_y < src_h)
                    {
                        let index = src_y as usize * src_stride + src_x as usize;
                        dst[row + x as usize] = src[index];
                    }
                }
            }
        }
    }

    Ok(output)
}
