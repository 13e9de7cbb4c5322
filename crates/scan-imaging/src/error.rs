//! Error types for pixel buffers, resampling and filters.

use std::fmt;

/// Error type for pixel buffer construction and access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelBufferError {
    /// Buffer length does not match the declared dimensions
    LengthMismatch {
        /// Length implied by width and height
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },
    /// Coordinate outside the image
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

impl fmt::Display for PixelBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelBufferError::LengthMismatch { expected, actual } => write!(
                f,
                "pixel buffer length mismatch: expected {}, got {}",
                expected, actual
            ),
            PixelBufferError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "pixel ({}, {}) outside {}x{} image",
                x, y, width, height
            ),
        }
    }
}

impl std::error::Error for PixelBufferError {}

/// Error type for quadrilateral resampling.
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleError {
    /// The corner bounding box rounds to an empty (or non-finite) output
    DegenerateGeometry {
        /// Rounded output width
        width: f64,
        /// Rounded output height
        height: f64,
    },
    /// The corner bounding box exceeds the largest allowed output
    OutputTooLarge { width: u64, height: u64 },
    /// The cancellation flag was raised between tile rows
    Cancelled,
}

impl fmt::Display for ResampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleError::DegenerateGeometry { width, height } => write!(
                f,
                "degenerate geometry: output would be {}x{}",
                width, height
            ),
            ResampleError::OutputTooLarge { width, height } => {
                write!(f, "output too large: {}x{}", width, height)
            }
            ResampleError::Cancelled => write!(f, "resample cancelled"),
        }
    }
}

impl std::error::Error for ResampleError {}

/// Error type for parsing a filter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterError {
    name: String,
}

impl UnknownFilterError {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name that failed to parse.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for UnknownFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter: {}", self.name)
    }
}

impl std::error::Error for UnknownFilterError {}
