//! The fixed set of named filters.

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownFilterError;

/// Contrast factor of [`FilterKind::Enhanced`].
pub const ENHANCED_CONTRAST: f64 = 1.2;

/// Contrast factor of [`FilterKind::Document`].
pub const DOCUMENT_CONTRAST: f64 = 1.4;

/// Luma above this is white in [`FilterKind::BlackAndWhite`].
pub const BLACK_AND_WHITE_THRESHOLD: f64 = 128.0;

/// A per-pixel filter selectable by name.
///
/// Names are the wire names used by clients: `grayscale`, `blackAndWhite`,
/// `enhanced` and `document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// R = G = B = BT.601 luma
    Grayscale,
    /// Luma thresholded at 128 to pure black or white
    BlackAndWhite,
    /// Contrast stretch x1.2 around mid-grey
    Enhanced,
    /// Contrast stretch x1.4 around mid-grey
    Document,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Grayscale,
        FilterKind::BlackAndWhite,
        FilterKind::Enhanced,
        FilterKind::Document,
    ];

    /// Wire name of the filter.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::BlackAndWhite => "blackAndWhite",
            FilterKind::Enhanced => "enhanced",
            FilterKind::Document => "document",
        }
    }

    /// Contrast factor for the table-driven filters.
    pub fn contrast_factor(self) -> Option<f64> {
        match self {
            FilterKind::Enhanced => Some(ENHANCED_CONTRAST),
            FilterKind::Document => Some(DOCUMENT_CONTRAST),
            FilterKind::Grayscale | FilterKind::BlackAndWhite => None,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = UnknownFilterError;

    /// Parse a wire name. Matching is exact (case-sensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownFilterError::new(s))
    }
}
