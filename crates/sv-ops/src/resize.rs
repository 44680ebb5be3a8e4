//! Image resize and resampling.
//!
//! Every plane is resampled independently at its own resolution: the chroma
//! planes of 4:2:0 formats go to `ceil(w/2)`x`ceil(h/2)`.
//!
//! Source positions use pixel-centre alignment,
//! `src = (dst + 0.5) * src_len / dst_len - 0.5`, clamped to the plane, so
//! a same-size resize reproduces the input exactly.
//!
//! # Example
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat};
//! use sv_ops::{Interpolation, resize::{resize, resize_with}};
//!
//! let img = Image::new(64, 48, PixelFormat::J420, Orientation::TopLeft)?;
//! let half = resize(&img, 32, 24)?;
//! assert_eq!(half.plane_extent(1).width, 16);
//!
//! let blocky = resize_with(&img, 7, 5, Interpolation::Nearest)?;
//! assert_eq!(blocky.plane_extent(2).height, 3);
//! # Ok::<(), sv_ops::OpsError>(())
//! ```

use sv_core::{Image, PlaneBuf, PlaneExtent, check_dimensions, try_vec};
use tracing::{debug, trace};

use crate::OpsResult;
use crate::sample::{Interpolation, Tap, fill_value, sample_into};

/// Resizes `image` to `width`x`height` with bilinear interpolation.
///
/// A zero width or height yields an empty image.
pub fn resize(image: &Image, width: u32, height: u32) -> OpsResult<Image> {
    resize_with(image, width, height, Interpolation::default())
}

/// Resizes `image` to `width`x`height` with the given kernel.
///
/// An empty source yields an output filled with each plane's fill value.
/// Dimensions above [`sv_core::MAX_DIMENSION`] are rejected before
/// anything is allocated.
pub fn resize_with(
    image: &Image,
    width: u32,
    height: u32,
    interp: Interpolation,
) -> OpsResult<Image> {
    check_dimensions(width, height)?;
    trace!(
        src_w = image.width(),
        src_h = image.height(),
        width,
        height,
        interp = ?interp,
        "resize"
    );
    let format = image.format();
    let planes = (0..image.plane_count())
        .map(|plane| {
            let src = image.read_plane(plane)?;
            let extent = format.plane_extent(plane, width, height);
            resize_plane(&src, extent, interp, fill_value(format, plane))
        })
        .collect::<OpsResult<Vec<_>>>()?;
    debug!(width, height, "Resized image");
    Ok(Image::from_planes(
        width,
        height,
        format,
        image.orientation(),
        &planes,
    )?)
}

/// Source taps for every destination coordinate along one axis.
fn axis_taps(src_len: u32, dst_len: u32, interp: Interpolation) -> OpsResult<Vec<Tap>> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    let last = f64::from(src_len - 1);
    let mut taps = try_vec(dst_len as usize)?;
    taps.extend((0..dst_len).map(|d| {
        let pos = match interp {
            // Nearest picks the pixel whose span contains the centre.
            Interpolation::Nearest => ((f64::from(d) + 0.5) * scale).floor(),
            Interpolation::Bilinear => (f64::from(d) + 0.5) * scale - 0.5,
        };
        Tap::at(pos.clamp(0.0, last), src_len, interp)
    }));
    Ok(taps)
}

fn resize_plane(
    src: &PlaneBuf,
    extent: PlaneExtent,
    interp: Interpolation,
    fill: u8,
) -> OpsResult<PlaneBuf> {
    if src.width() == 0 || src.height() == 0 {
        return Ok(PlaneBuf::filled(extent, fill)?);
    }
    let mut dst = PlaneBuf::new(extent)?;
    if dst.is_empty() {
        return Ok(dst);
    }
    let x_taps = axis_taps(src.width(), extent.width, interp)?;
    let y_taps = axis_taps(src.height(), extent.height, interp)?;
    let bpp = extent.bytes_per_pixel;
    dst.for_each_row(|y, row| {
        let ty = y_taps[y as usize];
        for (out, &tx) in row.chunks_exact_mut(bpp).zip(&x_taps) {
            sample_into(src, tx, ty, out);
        }
    });
    Ok(dst)
}
