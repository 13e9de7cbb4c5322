//! 256-entry byte lookup tables.

/// Pivot for contrast stretching: mid-grey stays put.
pub const CONTRAST_PIVOT: f64 = 128.0;

/// Immutable byte -> byte mapping covering every channel value.
///
/// Tables are cheap to build (256 evaluations), so filters build one per
/// invocation and then index it once per channel per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    table: [u8; 256],
}

impl LookupTable {
    /// Build a table by evaluating `f` for every byte value.
    pub fn from_fn(f: impl Fn(u8) -> u8) -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = f(i as u8);
        }
        Self { table }
    }

    /// The table that maps every value to itself.
    pub fn identity() -> Self {
        Self::from_fn(|v| v)
    }

    /// Linear contrast stretch around [`CONTRAST_PIVOT`].
    ///
    /// `out = clamp(0, 255, factor * (in - 128) + 128)`, truncated to a byte.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_imaging::LookupTable;
    ///
    /// let lut = LookupTable::contrast(1.2);
    /// assert_eq!(lut.map(128), 128);
    /// assert_eq!(lut.map(255), 255);
    /// assert_eq!(lut.map(0), 0);
    /// ```
    pub fn contrast(factor: f64) -> Self {
        Self::from_fn(|v| {
            let stretched = factor * (v as f64 - CONTRAST_PIVOT) + CONTRAST_PIVOT;
            stretched.clamp(0.0, 255.0) as u8
        })
    }

    #[inline]
    pub fn map(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    pub fn as_slice(&self) -> &[u8; 256] {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let lut = LookupTable::identity();
        for v in 0..=255u8 {
            assert_eq!(lut.map(v), v);
        }
    }

    #[test]
    fn test_contrast_factor_one_is_identity() {
        assert_eq!(LookupTable::contrast(1.0), LookupTable::identity());
    }

    #[test]
    fn test_contrast_truncates() {
        let lut = LookupTable::contrast(1.2);
        // 1.2 * 1 + 128 = 129.2
        assert_eq!(lut.map(129), 129);
        // 1.2 * 10 + 128 = 140.0
        assert_eq!(lut.map(138), 140);
        // 1.2 * 100 + 128 = 248
        assert_eq!(lut.map(228), 248);
    }

    #[test]
    fn test_contrast_clamps_both_ends() {
        let lut = LookupTable::contrast(1.4);
        // 1.4 * -128 + 128 = -51.2
        assert_eq!(lut.map(0), 0);
        assert_eq!(lut.map(30), 0);
        // 1.4 * 127 + 128 = 305.8
        assert_eq!(lut.map(255), 255);
        assert_eq!(lut.map(230), 255);
    }

    #[test]
    fn test_monotonic() {
        for factor in [0.5, 1.2, 1.4, 3.0] {
            let lut = LookupTable::contrast(factor);
            for v in 1..=255u8 {
                assert!(
                    lut.map(v) >= lut.map(v - 1),
                    "contrast({factor}) decreases at {v}"
                );
            }
        }
    }
}
