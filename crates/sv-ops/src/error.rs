//! Error types for geometric operations.

use thiserror::Error;

/// Error type for geometric operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Image buffer error (bounds, allocation, plane shape).
    #[error("image error: {0}")]
    Core(#[from] sv_core::Error),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl OpsError {
    /// Returns `true` if a region exceeded the image bounds.
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_bounds_error())
    }

    /// Returns `true` if memory for the result could not be reserved.
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_allocation_error())
    }

    /// Returns `true` if requested dimensions were rejected.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_dimension_error())
    }
}

/// Result type for geometric operations.
pub type OpsResult<T> = Result<T, OpsError>;
