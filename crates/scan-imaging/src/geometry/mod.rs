//! Quadrilateral geometry and resampling.

mod corner;
mod resample;

pub use corner::{
    round_half_up, NormalizedCorner, PixelPoint, PixelQuad, Quad, MAX_OUTPUT_DIMENSION,
    MAX_OUTPUT_PIXELS,
};
pub use resample::{resample, resample_with_cancel, TILE_SIZE};

pub(crate) use resample::resample_in_tiles;
