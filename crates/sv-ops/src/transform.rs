//! Orientation changes, crops and region-of-interest views.
//!
//! # Operations
//!
//! - [`rotate`] - Re-lay out pixels for a new stored orientation
//! - [`region_of_interest`] - Zero-copy view of a rectangle
//! - [`crop`] - Independent copy of a rectangle
//!
//! # Example
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat};
//! use sv_ops::transform::{crop, region_of_interest, rotate};
//!
//! let img = Image::new(64, 32, PixelFormat::NV12, Orientation::TopLeft)?;
//!
//! // Rotate so the stored pixels need a 90° clockwise turn for display.
//! let turned = rotate(&img, Orientation::RightTop)?;
//! assert_eq!(turned.dimensions(), (32, 64));
//!
//! let roi = region_of_interest(&img, 8, 8, 16, 16)?;
//! assert!(roi.shares_storage_with(&img));
//! let cut = crop(&img, 8, 8, 16, 16)?;
//! assert!(!cut.shares_storage_with(&img));
//! # Ok::<(), sv_ops::OpsError>(())
//! ```

use sv_core::{Image, Orientation, PlaneBuf, Rect, Relayout};
use tracing::{debug, trace};

use crate::OpsResult;

/// Re-lays out `image` so its stored orientation becomes `orientation`.
///
/// The visual content is preserved: the re-layout applied is the one that
/// takes pixels stored with the input orientation to pixels stored with
/// `orientation`. For the four axis-swapping re-layouts the output width
/// and height are exchanged. Every plane is rearranged at its own
/// resolution, moving whole samples (an NV12 UV pair stays together).
pub fn rotate(image: &Image, orientation: Orientation) -> OpsResult<Image> {
    let relayout = image.orientation().relayout_to(orientation);
    trace!(
        width = image.width(),
        height = image.height(),
        from = %image.orientation(),
        to = %orientation,
        "rotate"
    );
    let (width, height) = relayout.output_size(image.width(), image.height());
    let format = image.format();
    let planes = (0..image.plane_count())
        .map(|plane| {
            let src = image.read_plane(plane)?;
            relayout_plane(&src, relayout, format.plane_extent(plane, width, height))
        })
        .collect::<OpsResult<Vec<_>>>()?;
    debug!(width, height, relayout = ?relayout, "Rotated image");
    Ok(Image::from_planes(width, height, format, orientation, &planes)?)
}

fn relayout_plane(
    src: &PlaneBuf,
    relayout: Relayout,
    extent: sv_core::PlaneExtent,
) -> OpsResult<PlaneBuf> {
    if relayout == Relayout::IDENTITY {
        return Ok(src.clone());
    }
    let mut dst = PlaneBuf::new(extent)?;
    let bpp = extent.bytes_per_pixel;
    let (src_w, src_h) = (src.width(), src.height());
    dst.for_each_row(|y, row| {
        for (x, out) in row.chunks_exact_mut(bpp.max(1)).enumerate() {
            let (sx, sy) = relayout.source_pixel(x as u32, y, src_w, src_h);
            out.copy_from_slice(src.get(sx, sy));
        }
    });
    Ok(dst)
}

/// Returns a view of `w`x`h` pixels at `(x, y)` sharing `image`'s storage.
///
/// Fails with an out-of-bounds error unless `x + w <= width` and
/// `y + h <= height`. Writes through the view are visible in `image`.
pub fn region_of_interest(image: &Image, x: u32, y: u32, w: u32, h: u32) -> OpsResult<Image> {
    trace!(x, y, w, h, "region_of_interest");
    Ok(image.view(Rect::new(x, y, w, h))?)
}

/// Copies `w`x`h` pixels at `(x, y)` into a new, independent image.
///
/// Same bounds rule as [`region_of_interest`].
///
/// # Example
///
/// ```rust
/// use sv_core::{Image, Orientation, PixelFormat};
/// use sv_ops::transform::crop;
///
/// let img = Image::new(64, 64, PixelFormat::RGB, Orientation::TopLeft)?;
/// let cropped = crop(&img, 10, 10, 20, 20)?;
/// assert_eq!(cropped.logical_size(), 20 * 20 * 3);
/// assert!(crop(&img, 60, 0, 8, 8).is_err());
/// # Ok::<(), sv_ops::OpsError>(())
/// ```
pub fn crop(image: &Image, x: u32, y: u32, w: u32, h: u32) -> OpsResult<Image> {
    trace!(x, y, w, h, "crop");
    let view = image.view(Rect::new(x, y, w, h))?;
    Ok(view.deep_clone()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_core::PixelFormat;

    fn ramp(width: u32, height: u32, format: PixelFormat) -> Image {
        let mut img = Image::new(width, height, format, Orientation::TopLeft).unwrap();
        let mut v = 0u8;
        for plane in 0..img.plane_count() {
            let ext = img.plane_extent(plane);
            let row_len = ext.row_bytes();
            for y in 0..ext.height {
                let row: Vec<u8> = (0..row_len)
                    .map(|_| {
                        v = v.wrapping_add(1);
                        v
                    })
                    .collect();
                img.write_row(plane, y, &row).unwrap();
            }
        }
        img
    }

    #[test]
    fn test_rotate_90() {
        // 3x2 gray:
        // 1 2 3
        // 4 5 6
        let img = ramp(3, 2, PixelFormat::GRAY8);
        let out = rotate(&img, Orientation::LeftBottom).unwrap();
        // Displaying EXIF 8 turns 270° clockwise, so storage turns 90° clockwise:
        // 4 1
        // 5 2
        // 6 3
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.orientation(), Orientation::LeftBottom);
        assert_eq!(out.read_plane(0).unwrap().data(), &[4, 1, 5, 2, 6, 3]);
    }

    #[test]
    fn test_rotate_flip_h() {
        let img = ramp(3, 2, PixelFormat::GRAY8);
        let out = rotate(&img, Orientation::TopRight).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.read_plane(0).unwrap().data(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_rotate_same_orientation_copies() {
        let img = ramp(4, 4, PixelFormat::BGR);
        let out = rotate(&img, Orientation::TopLeft).unwrap();
        assert!(!out.shares_storage_with(&img));
        assert_eq!(out.read_plane(0).unwrap(), img.read_plane(0).unwrap());
    }

    #[test]
    fn test_rotate_round_trip_every_orientation() {
        for format in [PixelFormat::RGBA, PixelFormat::NV21, PixelFormat::J420] {
            let img = ramp(6, 4, format);
            for o in Orientation::ALL {
                let there = rotate(&img, o).unwrap();
                let back = rotate(&there, Orientation::TopLeft).unwrap();
                assert_eq!(back.dimensions(), img.dimensions());
                for plane in 0..img.plane_count() {
                    assert_eq!(
                        back.read_plane(plane).unwrap(),
                        img.read_plane(plane).unwrap(),
                        "{format} {o} plane {plane}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_rotate_moves_uv_pairs() {
        let img = ramp(4, 2, PixelFormat::NV12);
        // Chroma plane is 2x1 samples: [9,10] [11,12].
        let out = rotate(&img, Orientation::BottomRight).unwrap();
        assert_eq!(out.read_plane(1).unwrap().data(), &[11, 12, 9, 10]);
    }

    #[test]
    fn test_rotate_odd_yuv_dimensions() {
        let img = ramp(5, 3, PixelFormat::J420);
        let out = rotate(&img, Orientation::RightTop).unwrap();
        assert_eq!(out.dimensions(), (3, 5));
        assert_eq!(out.plane_extent(1).width, 2);
        assert_eq!(out.plane_extent(1).height, 3);
    }

    #[test]
    fn test_roi_aliases_crop_does_not() {
        let img = ramp(4, 4, PixelFormat::GRAY8);
        let mut roi = region_of_interest(&img, 1, 1, 2, 2).unwrap();
        let mut cut = crop(&img, 1, 1, 2, 2).unwrap();
        assert_eq!(roi.read_plane(0).unwrap(), cut.read_plane(0).unwrap());

        roi.set_sample(0, 0, 0, &[0xAA]).unwrap();
        assert_eq!(img.sample(0, 1, 1).unwrap().as_slice(), &[0xAA]);

        cut.set_sample(0, 1, 1, &[0xBB]).unwrap();
        assert_ne!(img.sample(0, 2, 2).unwrap().as_slice(), &[0xBB]);
        assert_eq!(img.ref_count(), Some(2));
    }

    #[test]
    fn test_bounds() {
        let img = ramp(4, 4, PixelFormat::GRAY8);
        assert!(region_of_interest(&img, 3, 0, 2, 1).unwrap_err().is_bounds_error());
        assert!(crop(&img, 0, 3, 1, 2).unwrap_err().is_bounds_error());
        let empty = crop(&img, 4, 4, 0, 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_roi_of_external_is_external() {
        let mut buf: Vec<u8> = (0..16).collect();
        let img = unsafe { Image::from_gray(4, 4, &mut buf, Default::default()) }.unwrap();
        let roi = region_of_interest(&img, 2, 2, 2, 2).unwrap();
        assert!(roi.is_external());
        assert_eq!(roi.sample(0, 0, 0).unwrap().as_slice(), &[10]);
        let cut = crop(&img, 2, 2, 2, 2).unwrap();
        assert!(cut.is_owned());
    }
}
