//! Affine warp.
//!
//! The 2x3 matrix `M = [m0, m1, m2, m3, m4, m5]` maps every *output* pixel
//! back to the input:
//!
//! ```text
//! x' = m0 * x + m1 * y + m2
//! y' = m3 * x + m4 * y + m5
//! ```
//!
//! Positions inside `[0, w-1] x [0, h-1]` of the source plane are sampled
//! with the chosen kernel; anything else gets the plane's fill value.
//! Chroma planes are mapped through luma-space sample centres, so one
//! matrix moves luma and chroma consistently.
//!
//! When the `parallel` feature is enabled, rows are processed with rayon.
//!
//! # Example
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat};
//! use sv_ops::warp::warp;
//!
//! let img = Image::new(32, 32, PixelFormat::BGR, Orientation::TopLeft)?;
//! // Shift the content 4 pixels to the right.
//! let shifted = warp(&img, [1.0, 0.0, -4.0, 0.0, 1.0, 0.0], 32, 32)?;
//! assert_eq!(shifted.dimensions(), (32, 32));
//! # Ok::<(), sv_ops::OpsError>(())
//! ```

use glam::Affine2;
use sv_core::{Image, PlaneBuf, PlaneExtent, check_dimensions};
use tracing::{debug, trace};

use crate::sample::{Interpolation, Tap, fill_value, sample_into};
use crate::{OpsError, OpsResult};

/// Warps `image` into a `width`x`height` output with bilinear sampling.
pub fn warp(image: &Image, matrix: [f32; 6], width: u32, height: u32) -> OpsResult<Image> {
    warp_with(image, matrix, width, height, Interpolation::Bilinear)
}

/// Warps with a [`glam::Affine2`] mapping output coordinates to input coordinates.
///
/// ```rust
/// use glam::{Affine2, Vec2};
/// use sv_core::{Image, Orientation, PixelFormat};
/// use sv_ops::warp::warp_affine;
///
/// let img = Image::new(16, 16, PixelFormat::GRAY8, Orientation::TopLeft)?;
/// let zoom = Affine2::from_scale(Vec2::splat(0.5));
/// let out = warp_affine(&img, zoom, 16, 16)?;
/// assert_eq!(out.width(), 16);
/// # Ok::<(), sv_ops::OpsError>(())
/// ```
pub fn warp_affine(image: &Image, transform: Affine2, width: u32, height: u32) -> OpsResult<Image> {
    let m = transform.matrix2;
    let t = transform.translation;
    let matrix = [m.x_axis.x, m.y_axis.x, t.x, m.x_axis.y, m.y_axis.y, t.y];
    warp(image, matrix, width, height)
}

/// Warps with an explicit interpolation kernel.
///
/// Fails with [`OpsError::InvalidParameter`] if any matrix entry is NaN or
/// infinite, and rejects output dimensions above [`sv_core::MAX_DIMENSION`]
/// before allocating.
pub fn warp_with(
    image: &Image,
    matrix: [f32; 6],
    width: u32,
    height: u32,
    interp: Interpolation,
) -> OpsResult<Image> {
    check_dimensions(width, height)?;
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(OpsError::InvalidParameter(format!(
            "warp matrix must be finite, got {matrix:?}"
        )));
    }
    trace!(
        src_w = image.width(),
        src_h = image.height(),
        width,
        height,
        matrix = ?matrix,
        "warp"
    );
    let m = matrix.map(f64::from);
    let format = image.format();
    let planes = (0..image.plane_count())
        .map(|plane| {
            let src = image.read_plane(plane)?;
            let (sx, _) = format.subsampling(plane);
            let mapping = PlaneMapping {
                m,
                subsampled: sx > 1,
            };
            warp_plane(
                &src,
                format.plane_extent(plane, width, height),
                mapping,
                interp,
                fill_value(format, plane),
            )
        })
        .collect::<OpsResult<Vec<_>>>()?;
    debug!(width, height, "Warped image");
    Ok(Image::from_planes(
        width,
        height,
        format,
        image.orientation(),
        &planes,
    )?)
}

/// Output-to-input mapping for one plane.
#[derive(Clone, Copy)]
struct PlaneMapping {
    m: [f64; 6],
    subsampled: bool,
}

impl PlaneMapping {
    fn source(&self, x: u32, y: u32) -> (f64, f64) {
        let (mut x, mut y) = (f64::from(x), f64::from(y));
        if self.subsampled {
            // Chroma sample centre in luma coordinates.
            x = (x + 0.5) * 2.0 - 0.5;
            y = (y + 0.5) * 2.0 - 0.5;
        }
        let m = self.m;
        let mut sx = m[0] * x + m[1] * y + m[2];
        let mut sy = m[3] * x + m[4] * y + m[5];
        if self.subsampled {
            sx = (sx + 0.5) / 2.0 - 0.5;
            sy = (sy + 0.5) / 2.0 - 0.5;
        }
        (sx, sy)
    }
}

fn warp_plane(
    src: &PlaneBuf,
    extent: PlaneExtent,
    mapping: PlaneMapping,
    interp: Interpolation,
    fill: u8,
) -> OpsResult<PlaneBuf> {
    let mut dst = PlaneBuf::filled(extent, fill)?;
    if dst.is_empty() || src.is_empty() {
        return Ok(dst);
    }
    let max_x = f64::from(src.width() - 1);
    let max_y = f64::from(src.height() - 1);
    let bpp = extent.bytes_per_pixel;
    dst.for_each_row(|y, row| {
        for (x, out) in row.chunks_exact_mut(bpp).enumerate() {
            let (sx, sy) = mapping.source(x as u32, y);
            if !(0.0..=max_x).contains(&sx) || !(0.0..=max_y).contains(&sy) {
                continue;
            }
            let tx = Tap::at(sx, src.width(), interp);
            let ty = Tap::at(sy, src.height(), interp);
            sample_into(src, tx, ty, out);
        }
    });
    Ok(dst)
}
