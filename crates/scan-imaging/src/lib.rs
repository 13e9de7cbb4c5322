//! scan-imaging: perspective unwarp and filters for scanned documents
//!
//! This library takes a decoded photo of a document, cuts out the page
//! described by four corner points and straightens it into a rectangle, and
//! applies one of a small set of per-pixel filters suited to scans. It has
//! no dependencies; decoding and encoding image files is the caller's job.
//!
//! # Quick Start
//!
//! ```
//! use scan_imaging::{apply_filter, resample, FilterKind, NormalizedCorner, PixelImage, Quad};
//!
//! let photo = PixelImage::new(400, 300);
//!
//! // Corners as fractions of the photo's width and height,
//! // top-left, top-right, bottom-right, bottom-left.
//! let page = Quad::new(
//!     NormalizedCorner::new(0.10, 0.05),
//!     NormalizedCorner::new(0.90, 0.08),
//!     NormalizedCorner::new(0.88, 0.95),
//!     NormalizedCorner::new(0.12, 0.92),
//! );
//!
//! let mut scan = resample(&photo, &page).unwrap();
//! apply_filter(&mut scan, FilterKind::Document);
//! ```
//!
//! # Pixel Layout
//!
//! [`PixelImage`] is a flat row-major `Vec<u32>`, one word per pixel, with
//! channel bytes in memory order `[R, G, B, A]`. Use [`pack_rgba`] and
//! [`unpack_rgba`] to move between words and bytes.
//!
//! # Resampling
//!
//! [`resample`] sizes its output from the bounding box of the corners,
//! then for every output row interpolates the left and right page edges
//! and for every output column interpolates between them. The nearest
//! source pixel is copied; samples outside the source leave the output
//! pixel transparent black.
//!
//! The output size is an approximation: a quad with heavy perspective skew
//! gets the size of its bounding box, not of its sides. For photos of a page
//! taken roughly head-on this is indistinguishable from a projective solve
//! and far cheaper.
//!
//! # Filters
//!
//! | Name | Effect |
//! |------|--------|
//! | `grayscale` | R = G = B = 0.299 R + 0.587 G + 0.114 B |
//! | `blackAndWhite` | luma > 128 → white, else black |
//! | `enhanced` | contrast x1.2 around 128 |
//! | `document` | contrast x1.4 around 128 |
//!
//! See [`FilterKind`] and [`LookupTable`].

pub mod error;
pub mod filter;
pub mod geometry;
pub mod pixel;


pub use error::{PixelBufferError, ResampleError, UnknownFilterError};
pub use filter::{apply_filter, filtered, luma, FilterKind, LookupTable};
pub use geometry::{
    resample, resample_with_cancel, NormalizedCorner, PixelPoint, Quad, MAX_OUTPUT_DIMENSION,
    MAX_OUTPUT_PIXELS,
};
pub use pixel::{pack_rgba, unpack_rgba, PixelImage};
