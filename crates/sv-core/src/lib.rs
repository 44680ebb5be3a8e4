//! # sv-core
//!
//! Image buffers for the sv imaging pipeline.
//!
//! This crate provides the data model every other sv crate builds on:
//!
//! - [`PixelFormat`] - Packed 32-bit format descriptor and plane layout math
//! - [`Orientation`], [`Relayout`] - EXIF orientation and the eight axis-aligned re-layouts
//! - [`Image`] - Owned, external or shared-view image handle
//! - [`PlaneBuf`] - Tightly packed scratch plane for kernels
//! - [`Rect`] - Region of interest
//!
//! ## Ownership
//!
//! An image either owns a share of a reference-counted allocation or wraps
//! caller memory ([`Ownership`]). Views created with [`Image::view`] alias
//! their source; every other image-producing call copies.
//!
//! ```rust
//! use sv_core::prelude::*;
//!
//! let img = Image::new(64, 48, PixelFormat::NV12, Orientation::TopLeft)?;
//! assert_eq!(img.plane_count(), 2);
//! assert_eq!(img.plane_extent(1).width, 32);
//! # Ok::<(), sv_core::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! sv-core (this crate)
//!    ^
//!    |
//!    +-- sv-ops (rotate, crop, region of interest, resize, warp)
//!    +-- sv-color (format conversion)
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Process kernel rows on the rayon thread pool ([`PlaneBuf::for_each_row`])
//! - `serde` - Serialize [`PixelFormat`] (as its raw bits) and [`Orientation`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod format;
pub mod image;
pub mod orientation;
pub mod plane;
pub mod rect;

pub use buffer::{ExternalMemory, Ownership, PixelBuffer, try_vec};
pub use error::{Error, Result};
pub use format::{FormatKind, FormatLayout, LayoutKind, MAX_PLANES, PixelFormat, PlaneExtent};
pub use image::{ExternalPlane, Image, MAX_DIMENSION, Sample, WrapOptions, check_dimensions};
pub use orientation::{Orientation, Relayout};
pub use plane::PlaneBuf;
pub use rect::Rect;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use sv_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::format::{FormatKind, PixelFormat, PlaneExtent};
    pub use crate::image::{Image, WrapOptions};
    pub use crate::orientation::Orientation;
    pub use crate::plane::PlaneBuf;
    pub use crate::rect::Rect;
}
