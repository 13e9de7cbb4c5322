//! Normalized corners and the source quadrilateral.

use crate::error::ResampleError;

/// Largest output edge the resampler will allocate.
pub const MAX_OUTPUT_DIMENSION: u32 = 32_768;

/// Largest output area the resampler will allocate (8192 x 8192).
pub const MAX_OUTPUT_PIXELS: u64 = 67_108_864;

/// A point expressed as fractions of the source width and height.
///
/// Values are nominally in `0.0..=1.0`. They are not clamped: points outside
/// the source simply sample nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedCorner {
    pub dx: f64,
    pub dy: f64,
}

impl NormalizedCorner {
    #[inline]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Scale to pixel coordinates of a `width` x `height` source.
    #[inline]
    pub fn to_pixel(self, width: u32, height: u32) -> PixelPoint {
        PixelPoint {
            x: self.dx * width as f64,
            y: self.dy * height as f64,
        }
    }
}

/// A point in source pixel space (not rounded).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Linear interpolation from `self` towards `other` at `t`.
    #[inline]
    pub fn lerp(self, other: PixelPoint, t: f64) -> PixelPoint {
        PixelPoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// The four corners of the region to unwarp.
///
/// Order matters and is the caller's responsibility: top-left, top-right,
/// bottom-right, bottom-left. A quad with its corners swapped still
/// resamples, it just produces a mirrored or rotated result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub top_left: NormalizedCorner,
    pub top_right: NormalizedCorner,
    pub bottom_right: NormalizedCorner,
    pub bottom_left: NormalizedCorner,
}

impl Quad {
    pub const fn new(
        top_left: NormalizedCorner,
        top_right: NormalizedCorner,
        bottom_right: NormalizedCorner,
        bottom_left: NormalizedCorner,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The whole source image.
    pub const fn full() -> Self {
        Self::new(
            NormalizedCorner::new(0.0, 0.0),
            NormalizedCorner::new(1.0, 0.0),
            NormalizedCorner::new(1.0, 1.0),
            NormalizedCorner::new(0.0, 1.0),
        )
    }

    /// Corners in wire order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [NormalizedCorner; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Scale all four corners to a `width` x `height` source.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelQuad {
        PixelQuad {
            top_left: self.top_left.to_pixel(width, height),
            top_right: self.top_right.to_pixel(width, height),
            bottom_right: self.bottom_right.to_pixel(width, height),
            bottom_left: self.bottom_left.to_pixel(width, height),
        }
    }
}

impl From<[NormalizedCorner; 4]> for Quad {
    fn from(corners: [NormalizedCorner; 4]) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = corners;
        Self::new(top_left, top_right, bottom_right, bottom_left)
    }
}

/// A [`Quad`] scaled to source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelQuad {
    pub top_left: PixelPoint,
    pub top_right: PixelPoint,
    pub bottom_right: PixelPoint,
    pub bottom_left: PixelPoint,
}

impl PixelQuad {
    fn points(&self) -> [PixelPoint; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Output size from the axis-aligned bounding box of the corners.
    ///
    /// This is a bounding-box approximation, not a projective solve: a
    /// strongly skewed quad gets the size of its bounding box rather than
    /// the lengths of its sides.
    pub fn output_size(&self) -> Result<(u32, u32), ResampleError> {
        let points = self.points();
        // f64::min/max skip NaN, so non-finite corners are caught up front.
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ResampleError::DegenerateGeometry {
                width: f64::NAN,
                height: f64::NAN,
            });
        }

        let mut min_x = points[0].x;
        let mut max_x = points[0].x;
        let mut min_y = points[0].y;
        let mut max_y = points[0].y;

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let width = round_half_up(max_x - min_x);
        let height = round_half_up(max_y - min_y);

        if width < 1.0 || height < 1.0 {
            return Err(ResampleError::DegenerateGeometry { width, height });
        }
        if width > MAX_OUTPUT_DIMENSION as f64
            || height > MAX_OUTPUT_DIMENSION as f64
            || width * height > MAX_OUTPUT_PIXELS as f64
        {
            return Err(ResampleError::OutputTooLarge {
                width: width as u64,
                height: height as u64,
            });
        }

        Ok((width as u32, height as u32))
    }
}

/// Round to the nearest integer, ties towards positive infinity.
///
/// `f64::round` sends -0.5 to -1; sampling needs it to land on 0.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
