//! Error types for format conversion.

use sv_core::PixelFormat;
use thiserror::Error;

/// Format conversion error.
#[derive(Debug, Error)]
pub enum ColorError {
    /// Image buffer error (allocation, plane shape).
    #[error("image error: {0}")]
    Core(#[from] sv_core::Error),

    /// No edge in the conversion graph connects the two formats.
    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion {
        /// Source format.
        from: PixelFormat,
        /// Target format.
        to: PixelFormat,
    },
}

impl ColorError {
    /// Creates an [`ColorError::UnsupportedConversion`] error.
    pub fn unsupported(from: PixelFormat, to: PixelFormat) -> Self {
        Self::UnsupportedConversion { from, to }
    }

    /// Returns `true` if memory for the result could not be reserved.
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_allocation_error())
    }
}

/// Result type for format conversion.
pub type ColorResult<T> = Result<T, ColorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_passes_through() {
        let err: ColorError = sv_core::try_vec::<u8>(usize::MAX).unwrap_err().into();
        assert!(err.is_allocation_error());
        let unsupported = ColorError::unsupported(PixelFormat::RGB, PixelFormat::NV12);
        assert!(!unsupported.is_allocation_error());
    }
}
