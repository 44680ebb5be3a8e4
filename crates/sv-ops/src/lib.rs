//! # sv-ops
//!
//! Geometric operations on [`sv_core::Image`].
//!
//! Every operation reads its input and returns a new owned image; none
//! writes into its input. The one exception to "new storage" is
//! [`region_of_interest`], which returns a view aliasing the source.
//!
//! # Modules
//!
//! - [`transform`] - Rotate/mirror to a target orientation, crop, region of interest
//! - [`resize`] - Per-plane resampling
//! - [`warp`] - Affine warp with inverse mapping
//!
//! # Example
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat};
//!
//! let img = Image::new(640, 480, PixelFormat::NV12, Orientation::RightTop)?;
//!
//! // Make the stored pixels upright, then scale down.
//! let upright = sv_ops::rotate(&img, Orientation::TopLeft)?;
//! assert_eq!(upright.dimensions(), (480, 640));
//! let small = sv_ops::resize(&upright, 240, 320)?;
//! assert_eq!(small.plane_extent(1).width, 120);
//! # Ok::<(), sv_ops::OpsError>(())
//! ```
//!
//! # Interpolation
//!
//! Resize and warp default to bilinear sampling with weights quantized to
//! 11 fractional bits, so results are bit-exact across platforms. Use
//! [`Interpolation::Nearest`] through [`resize_with`] or [`warp_with`] for
//! nearest-neighbor sampling.
//!
//! # Feature Flags
//!
//! - `parallel` (default) - Process rows on the rayon thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod resize;
pub mod sample;
pub mod transform;
pub mod warp;

pub use error::{OpsError, OpsResult};
pub use resize::{resize, resize_with};
pub use sample::{Interpolation, fill_value};
pub use transform::{crop, region_of_interest, rotate};
pub use warp::{warp, warp_affine, warp_with};
