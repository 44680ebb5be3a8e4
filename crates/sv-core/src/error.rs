//! Error types for sv-core operations.
//!
//! Every fallible operation on an [`crate::Image`] reports its failure through
//! [`Error`]. Nothing in this crate panics on bad input and nothing is retried
//! internally: the caller always sees the original condition.
//!
//! # Usage
//!
//! ```rust
//! use sv_core::{Error, Result};
//!
//! fn check(x: u32, w: u32, width: u32) -> Result<()> {
//!     if x + w > width {
//!         return Err(Error::out_of_bounds(x, 0, w, 1, width, 1));
//!     }
//!     Ok(())
//! }
//! assert!(check(3, 2, 4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating, viewing or copying images.
///
/// # Categories
///
/// - **Bounds errors**: [`OutOfBounds`](Error::OutOfBounds)
/// - **Shape errors**: [`ShapeMismatch`](Error::ShapeMismatch), [`InvalidStride`](Error::InvalidStride),
///   [`InvalidPlane`](Error::InvalidPlane)
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
#[derive(Debug, Error)]
pub enum Error {
    /// Width/height cannot be represented.
    ///
    /// Sizes are unsigned, so negative dimensions are rejected by the type
    /// system. This variant covers dimensions above `i32::MAX` and byte
    /// sizes that overflow `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// A region of interest or crop rectangle exceeds the image extent.
    #[error("region ({x}, {y}, {w}x{h}) exceeds image bounds {width}x{height}")]
    OutOfBounds {
        /// Region X origin
        x: u32,
        /// Region Y origin
        y: u32,
        /// Region width
        w: u32,
        /// Region height
        h: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// A destination buffer cannot hold the source plane extents.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A row stride is smaller than the minimal row size of its plane.
    #[error("stride {stride} of plane {plane} is less than minimum {min_stride}")]
    InvalidStride {
        /// Plane index
        plane: usize,
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
    },

    /// The plane index is not active for the image format.
    #[error("plane {plane} is not present in format {format}")]
    InvalidPlane {
        /// Requested plane index
        plane: usize,
        /// Format name
        format: &'static str,
    },

    /// Memory for the pixel buffer could not be reserved.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, w: u32, h: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            w,
            h,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ShapeMismatch`] error.
    #[inline]
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }

    /// Returns `true` if width or height were rejected.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::InvalidDimensions { .. })
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(3, 1, 2, 2, 4, 4);
        let msg = err.to_string();
        assert!(msg.contains("(3, 1, 2x2)"));
        assert!(msg.contains("4x4"));
        assert!(err.is_bounds_error());
        assert!(!err.is_allocation_error());
    }

    #[test]
    fn test_allocation_failed() {
        let err = Error::allocation_failed(usize::MAX, "capacity overflow");
        assert!(err.to_string().contains("capacity overflow"));
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_invalid_stride_message() {
        let err = Error::InvalidStride {
            plane: 0,
            stride: 5,
            min_stride: 6,
        };
        assert_eq!(err.to_string(), "stride 5 of plane 0 is less than minimum 6");
    }
}
