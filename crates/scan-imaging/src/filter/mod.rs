//! Lookup-table driven per-pixel filters.
//!
//! Every filter works on R, G and B only; alpha passes through. The
//! contrast filters evaluate their formula 256 times to build a
//! [`LookupTable`] and then do one table read per channel, so cost is
//! `O(256 + pixels)` regardless of image size.

mod apply;
mod kind;
mod lut;

pub use apply::{apply_filter, apply_lookup_table, filtered, luma};
pub use kind::{FilterKind, BLACK_AND_WHITE_THRESHOLD, DOCUMENT_CONTRAST, ENHANCED_CONTRAST};
pub use lut::{LookupTable, CONTRAST_PIVOT};
