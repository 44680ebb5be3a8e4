//! # sv-color
//!
//! Pixel format conversion for [`sv_core::Image`].
//!
//! Any canonical format converts to any other through [`convert`]:
//!
//! | From \ To      | Packed (GRAY8, BGR, BGRA, RGB, RGBA) | 4:2:0 (J420, NV12, NV21) |
//! |----------------|--------------------------------------|--------------------------|
//! | Packed         | channel reorder, alpha, luma         | YCbCr + 2x2 box chroma   |
//! | 4:2:0          | chroma upsample + inverse transform  | chroma repack            |
//!
//! YCbCr is BT.601 full range in 16-bit fixed point ([`coeffs`]), so every
//! conversion is bit-exact and deterministic.
//!
//! # Example
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat};
//! use sv_color::{ChromaUpsampling, ConvertOptions, convert, convert_with};
//!
//! let frame = Image::new(64, 48, PixelFormat::NV21, Orientation::TopLeft)?;
//! let gray = convert(&frame, PixelFormat::GRAY8)?;
//! assert_eq!(gray.dimensions(), (64, 48));
//!
//! let opts = ConvertOptions { chroma_upsampling: ChromaUpsampling::Bilinear };
//! let rgb = convert_with(&frame, PixelFormat::RGB, opts)?;
//! assert_eq!(rgb.plane_count(), 1);
//! # Ok::<(), sv_color::ColorError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - Process rows on the rayon thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod chroma;
pub mod coeffs;
pub mod convert;
mod error;

pub use chroma::ChromaUpsampling;
pub use convert::{
    ConversionEdge, ConvertOptions, conversion_edge, convert, convert_with, is_supported,
};
pub use error::{ColorError, ColorResult};
