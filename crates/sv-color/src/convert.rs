//! Format-to-format conversion.
//!
//! Conversions form a small directed graph over the canonical formats.
//! Every pair of canonical formats is connected by exactly one
//! [`ConversionEdge`]:
//!
//! ```text
//!   GRAY8 BGR BGRA RGB RGBA  ──Encode──►  J420 NV12 NV21
//!      ▲      Reorder       ◄──Decode──     ▲  Repack
//!      └─────────┘                          └────┘
//! ```
//!
//! Encoding converts each pixel to YCbCr and box-averages chroma over 2x2
//! blocks. Decoding upsamples chroma (see [`ChromaUpsampling`]) and
//! applies the inverse transform; decoding to GRAY8 copies luma unchanged.
//! Descriptors that are not one of the canonical constants are rejected
//! with [`ColorError::UnsupportedConversion`].

use sv_core::{FormatKind, Image, PixelFormat, PlaneBuf, PlaneExtent, try_vec};
use tracing::{debug, trace};

use crate::chroma::{ChromaUpsampling, downsample_box, upsample};
use crate::coeffs::{luma, rgb_to_ycbcr, ycbcr_to_rgb};
use crate::{ColorError, ColorResult};

/// Options for [`convert_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Chroma reconstruction when decoding 4:2:0 formats. Default: nearest.
    pub chroma_upsampling: ChromaUpsampling,
}

/// Kind of work a conversion between two formats performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionEdge {
    /// Same format: deep copy.
    Copy,
    /// Packed to packed: channel reorder, alpha add/drop, gray expand/collapse.
    Reorder,
    /// Packed to 4:2:0 YCbCr.
    Encode,
    /// 4:2:0 YCbCr to packed.
    Decode,
    /// Between 4:2:0 layouts: chroma re-interleave or channel swap.
    Repack,
}

/// Edge connecting `from` to `to`, or `None` if either is not canonical.
pub fn conversion_edge(from: PixelFormat, to: PixelFormat) -> Option<ConversionEdge> {
    let (src, dst) = (from.kind()?, to.kind()?);
    Some(match (src.is_packed(), dst.is_packed()) {
        _ if src == dst => ConversionEdge::Copy,
        (true, true) => ConversionEdge::Reorder,
        (true, false) => ConversionEdge::Encode,
        (false, true) => ConversionEdge::Decode,
        (false, false) => ConversionEdge::Repack,
    })
}

/// Returns `true` if [`convert`] accepts the pair.
#[inline]
pub fn is_supported(from: PixelFormat, to: PixelFormat) -> bool {
    conversion_edge(from, to).is_some()
}

/// Converts `image` to `to` with default options.
///
/// # Example
///
/// ```rust
/// use sv_core::{Image, Orientation, PixelFormat};
/// use sv_color::convert;
///
/// let bgra = Image::new(8, 8, PixelFormat::BGRA, Orientation::TopLeft)?;
/// let nv12 = convert(&bgra, PixelFormat::NV12)?;
/// assert_eq!(nv12.format(), PixelFormat::NV12);
/// assert_eq!(nv12.dimensions(), (8, 8));
/// # Ok::<(), sv_color::ColorError>(())
/// ```
pub fn convert(image: &Image, to: PixelFormat) -> ColorResult<Image> {
    convert_with(image, to, ConvertOptions::default())
}

/// Converts `image` to `to`.
///
/// The result is a new owned image with the same dimensions and
/// orientation as `image`.
pub fn convert_with(image: &Image, to: PixelFormat, options: ConvertOptions) -> ColorResult<Image> {
    let from = image.format();
    let (Some(src_kind), Some(dst_kind), Some(edge)) =
        (from.kind(), to.kind(), conversion_edge(from, to))
    else {
        return Err(ColorError::unsupported(from, to));
    };
    trace!(%from, %to, edge = ?edge, width = image.width(), height = image.height(), "convert");
    let out = match (edge, Packed::of(src_kind), Packed::of(dst_kind)) {
        (ConversionEdge::Copy, _, _) => image.deep_clone()?,
        (ConversionEdge::Reorder, Some(src), Some(dst)) => reorder(image, src, dst, to)?,
        (ConversionEdge::Encode, Some(src), None) => {
            let planes = encode(image, src)?;
            planes.into_image(image, dst_kind)?
        }
        (ConversionEdge::Decode, None, Some(dst)) => {
            let planes = Ycbcr::split(image, src_kind)?;
            decode(image, planes, dst, to, options.chroma_upsampling)?
        }
        (ConversionEdge::Repack, None, None) => {
            Ycbcr::split(image, src_kind)?.into_image(image, dst_kind)?
        }
        _ => return Err(ColorError::unsupported(from, to)),
    };
    debug!(%from, %to, "Converted image");
    Ok(out)
}

/// Channel positions of a packed format.
#[derive(Debug, Clone, Copy)]
struct Packed {
    rgb: Option<[usize; 3]>,
    alpha: Option<usize>,
}

impl Packed {
    fn of(kind: FormatKind) -> Option<Self> {
        let (rgb, alpha) = match kind {
            FormatKind::Gray8 => (None, None),
            FormatKind::Bgr => (Some([2, 1, 0]), None),
            FormatKind::Bgra => (Some([2, 1, 0]), Some(3)),
            FormatKind::Rgb => (Some([0, 1, 2]), None),
            FormatKind::Rgba => (Some([0, 1, 2]), Some(3)),
            FormatKind::J420 | FormatKind::Nv12 | FormatKind::Nv21 => return None,
        };
        Some(Self { rgb, alpha })
    }

    /// `[r, g, b, a]` of one pixel; opaque when the format has no alpha.
    #[inline]
    fn read(&self, px: &[u8]) -> [u8; 4] {
        let a = self.alpha.map_or(255, |i| px[i]);
        match self.rgb {
            Some([r, g, b]) => [px[r], px[g], px[b], a],
            None => [px[0], px[0], px[0], a],
        }
    }

    #[inline]
    fn write(&self, px: &mut [u8], [r, g, b, a]: [u8; 4]) {
        match self.rgb {
            Some([ri, gi, bi]) => {
                px[ri] = r;
                px[gi] = g;
                px[bi] = b;
            }
            None => px[0] = luma(r, g, b),
        }
        if let Some(ai) = self.alpha {
            px[ai] = a;
        }
    }
}

fn reorder(image: &Image, src: Packed, dst: Packed, to: PixelFormat) -> ColorResult<Image> {
    let input = image.read_plane(0)?;
    let src_bpp = input.bytes_per_pixel();
    let extent = to.plane_extent(0, image.width(), image.height());
    let mut output = PlaneBuf::new(extent)?;
    output.for_each_row(|y, row| {
        let src_row = input.row(y);
        for (out, px) in row
            .chunks_exact_mut(extent.bytes_per_pixel)
            .zip(src_row.chunks_exact(src_bpp))
        {
            dst.write(out, src.read(px));
        }
    });
    Ok(Image::from_planes(
        image.width(),
        image.height(),
        to,
        image.orientation(),
        &[output],
    )?)
}

/// Full-resolution luma with separate subsampled chroma planes.
struct Ycbcr {
    y: PlaneBuf,
    cb: PlaneBuf,
    cr: PlaneBuf,
}

/// Byte offsets of Cb and Cr inside an interleaved chroma sample.
fn interleave_order(kind: FormatKind) -> (usize, usize) {
    match kind {
        FormatKind::Nv21 => (1, 0),
        _ => (0, 1),
    }
}

impl Ycbcr {
    fn split(image: &Image, kind: FormatKind) -> ColorResult<Self> {
        let y = image.read_plane(0)?;
        if kind == FormatKind::J420 {
            return Ok(Self {
                y,
                cb: image.read_plane(1)?,
                cr: image.read_plane(2)?,
            });
        }
        let uv = image.read_plane(1)?;
        let extent = PlaneExtent {
            bytes_per_pixel: 1,
            ..uv.extent()
        };
        let (cb_at, cr_at) = interleave_order(kind);
        let mut cb = try_vec(extent.size())?;
        let mut cr = try_vec(extent.size())?;
        for pair in uv.data().chunks_exact(2) {
            cb.push(pair[cb_at]);
            cr.push(pair[cr_at]);
        }
        Ok(Self {
            y,
            cb: PlaneBuf::from_vec(extent, cb)?,
            cr: PlaneBuf::from_vec(extent, cr)?,
        })
    }

    fn into_image(self, like: &Image, kind: FormatKind) -> ColorResult<Image> {
        let (width, height, orientation) = (like.width(), like.height(), like.orientation());
        let format = kind.format();
        if kind == FormatKind::J420 {
            return Ok(Image::from_planes(
                width,
                height,
                format,
                orientation,
                &[self.y, self.cb, self.cr],
            )?);
        }
        let (cb_at, cr_at) = interleave_order(kind);
        let mut uv = PlaneBuf::new(format.plane_extent(1, width, height))?;
        for ((pair, &cb), &cr) in uv
            .data_mut()
            .chunks_exact_mut(2)
            .zip(self.cb.data())
            .zip(self.cr.data())
        {
            pair[cb_at] = cb;
            pair[cr_at] = cr;
        }
        Ok(Image::from_planes(width, height, format, orientation, &[self.y, uv])?)
    }
}

fn encode(image: &Image, src: Packed) -> ColorResult<Ycbcr> {
    let input = image.read_plane(0)?;
    let bpp = input.bytes_per_pixel();
    let mut ycc = PlaneBuf::new(PlaneExtent {
        bytes_per_pixel: 3,
        ..input.extent()
    })?;
    ycc.for_each_row(|y, row| {
        for (out, px) in row.chunks_exact_mut(3).zip(input.row(y).chunks_exact(bpp)) {
            let [r, g, b, _] = src.read(px);
            out.copy_from_slice(&rgb_to_ycbcr(r, g, b));
        }
    });
    let [y, cb, cr] = split_channels(&ycc)?;
    Ok(Ycbcr {
        y,
        cb: downsample_box(&cb)?,
        cr: downsample_box(&cr)?,
    })
}

/// Splits a three-channel plane into three single-channel planes.
fn split_channels(plane: &PlaneBuf) -> ColorResult<[PlaneBuf; 3]> {
    let extent = PlaneExtent {
        bytes_per_pixel: 1,
        ..plane.extent()
    };
    let mut channels = [
        try_vec(extent.size())?,
        try_vec(extent.size())?,
        try_vec(extent.size())?,
    ];
    for px in plane.data().chunks_exact(3) {
        for (channel, &v) in channels.iter_mut().zip(px) {
            channel.push(v);
        }
    }
    let [a, b, c] = channels;
    Ok([
        PlaneBuf::from_vec(extent, a)?,
        PlaneBuf::from_vec(extent, b)?,
        PlaneBuf::from_vec(extent, c)?,
    ])
}

fn decode(
    image: &Image,
    planes: Ycbcr,
    dst: Packed,
    to: PixelFormat,
    mode: ChromaUpsampling,
) -> ColorResult<Image> {
    let (width, height, orientation) = (image.width(), image.height(), image.orientation());
    if dst.rgb.is_none() {
        return Ok(Image::from_planes(width, height, to, orientation, &[planes.y])?);
    }
    let cb = upsample(&planes.cb, width, height, mode)?;
    let cr = upsample(&planes.cr, width, height, mode)?;
    let luma = &planes.y;
    let extent = to.plane_extent(0, width, height);
    let mut output = PlaneBuf::new(extent)?;
    output.for_each_row(|y, row| {
        let (ys, cbs, crs) = (luma.row(y), cb.row(y), cr.row(y));
        for (x, out) in row.chunks_exact_mut(extent.bytes_per_pixel).enumerate() {
            let [r, g, b] = ycbcr_to_rgb(ys[x], cbs[x], crs[x]);
            dst.write(out, [r, g, b, 255]);
        }
    });
    Ok(Image::from_planes(width, height, to, orientation, &[output])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_core::Orientation;

    fn packed(width: u32, height: u32, format: PixelFormat, data: &[u8]) -> Image {
        let ext = format.plane_extent(0, width, height);
        let plane = PlaneBuf::from_vec(ext, data.to_vec()).unwrap();
        Image::from_planes(width, height, format, Orientation::TopLeft, &[plane]).unwrap()
    }

    fn bytes(image: &Image, plane: usize) -> Vec<u8> {
        image.read_plane(plane).unwrap().into_vec()
    }

    #[test]
    fn test_edges() {
        let edge = |a, b| conversion_edge(a, b).unwrap();
        assert_eq!(edge(PixelFormat::RGB, PixelFormat::RGB), ConversionEdge::Copy);
        assert_eq!(edge(PixelFormat::BGR, PixelFormat::RGBA), ConversionEdge::Reorder);
        assert_eq!(edge(PixelFormat::GRAY8, PixelFormat::NV21), ConversionEdge::Encode);
        assert_eq!(edge(PixelFormat::J420, PixelFormat::BGRA), ConversionEdge::Decode);
        assert_eq!(edge(PixelFormat::NV12, PixelFormat::NV21), ConversionEdge::Repack);
        let odd = PixelFormat::encode(0, 16, 0, 0);
        assert_eq!(conversion_edge(odd, PixelFormat::RGB), None);
        for a in PixelFormat::ALL {
            for b in PixelFormat::ALL {
                assert!(is_supported(a, b));
            }
        }
    }

    #[test]
    fn test_unsupported() {
        let img = Image::new(2, 2, PixelFormat::encode(9, 24, 0, 0), Orientation::TopLeft).unwrap();
        let err = convert(&img, PixelFormat::RGB).unwrap_err();
        assert!(matches!(err, ColorError::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_bgr_rgb_swap() {
        let img = packed(2, 1, PixelFormat::BGR, &[1, 2, 3, 4, 5, 6]);
        let rgb = convert(&img, PixelFormat::RGB).unwrap();
        assert_eq!(bytes(&rgb, 0), vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_alpha_added_and_dropped() {
        let img = packed(1, 1, PixelFormat::RGB, &[9, 8, 7]);
        let bgra = convert(&img, PixelFormat::BGRA).unwrap();
        assert_eq!(bytes(&bgra, 0), vec![7, 8, 9, 255]);

        let rgba = packed(1, 1, PixelFormat::RGBA, &[9, 8, 7, 42]);
        let bgra = convert(&rgba, PixelFormat::BGRA).unwrap();
        assert_eq!(bytes(&bgra, 0), vec![7, 8, 9, 42]);
        let rgb = convert(&rgba, PixelFormat::RGB).unwrap();
        assert_eq!(bytes(&rgb, 0), vec![9, 8, 7]);
    }

    #[test]
    fn test_bgra_to_gray_uses_luma() {
        let data = [0, 0, 255, 17, 0, 255, 0, 0, 255, 0, 0, 255, 30, 60, 90, 0];
        let img = packed(2, 2, PixelFormat::BGRA, &data);
        let gray = convert(&img, PixelFormat::GRAY8).unwrap();
        let expected: Vec<u8> = data
            .chunks_exact(4)
            .map(|px| luma(px[2], px[1], px[0]))
            .collect();
        assert_eq!(bytes(&gray, 0), expected);
        assert_eq!(expected[0], 76);
    }

    #[test]
    fn test_gray_expands() {
        let img = packed(2, 1, PixelFormat::GRAY8, &[5, 250]);
        let rgba = convert(&img, PixelFormat::RGBA).unwrap();
        assert_eq!(bytes(&rgba, 0), vec![5, 5, 5, 255, 250, 250, 250, 255]);
    }

    #[test]
    fn test_same_format_copies() {
        let img = packed(2, 1, PixelFormat::RGB, &[1, 2, 3, 4, 5, 6]);
        let out = convert(&img, PixelFormat::RGB).unwrap();
        assert!(!out.shares_storage_with(&img));
        assert_eq!(bytes(&out, 0), bytes(&img, 0));
    }

    #[test]
    fn test_encode_constant_color() {
        let img = packed(3, 3, PixelFormat::RGB, &[255, 0, 0].repeat(9));
        for format in [PixelFormat::J420, PixelFormat::NV12, PixelFormat::NV21] {
            let yuv = convert(&img, format).unwrap();
            assert_eq!(yuv.dimensions(), (3, 3));
            assert!(bytes(&yuv, 0).iter().all(|&v| v == 76));
        }
        let nv12 = convert(&img, PixelFormat::NV12).unwrap();
        assert_eq!(bytes(&nv12, 1), [85, 255].repeat(4));
        let nv21 = convert(&img, PixelFormat::NV21).unwrap();
        assert_eq!(bytes(&nv21, 1), [255, 85].repeat(4));
        let j420 = convert(&img, PixelFormat::J420).unwrap();
        assert_eq!(bytes(&j420, 1), vec![85; 4]);
        assert_eq!(bytes(&j420, 2), vec![255; 4]);
    }

    #[test]
    fn test_encode_box_averages_chroma() {
        // Left column blue, right column red: Cb 255/85, Cr 107/255.
        let data = [0, 0, 255, 255, 0, 0, 0, 0, 255, 255, 0, 0];
        let img = packed(2, 2, PixelFormat::RGB, &data);
        let j420 = convert(&img, PixelFormat::J420).unwrap();
        assert_eq!(bytes(&j420, 0), vec![29, 76, 29, 76]);
        assert_eq!(bytes(&j420, 1), vec![170]);
        assert_eq!(bytes(&j420, 2), vec![181]);
    }

    #[test]
    fn test_decode_to_gray_copies_luma() {
        let mut img = Image::new(3, 2, PixelFormat::NV21, Orientation::TopLeft).unwrap();
        img.write_row(0, 0, &[1, 2, 3]).unwrap();
        img.write_row(0, 1, &[4, 5, 6]).unwrap();
        img.fill_plane(1, &[10, 240]).unwrap();
        let gray = convert(&img, PixelFormat::GRAY8).unwrap();
        assert_eq!(bytes(&gray, 0), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_neutral_chroma_is_gray() {
        let mut img = Image::new(4, 2, PixelFormat::J420, Orientation::TopLeft).unwrap();
        img.write_row(0, 0, &[0, 50, 100, 150]).unwrap();
        img.write_row(0, 1, &[200, 250, 255, 1]).unwrap();
        img.fill_plane(1, &[128]).unwrap();
        img.fill_plane(2, &[128]).unwrap();
        for mode in [ChromaUpsampling::Nearest, ChromaUpsampling::Bilinear] {
            let opts = ConvertOptions { chroma_upsampling: mode };
            let rgb = convert_with(&img, PixelFormat::RGB, opts).unwrap();
            let expected: Vec<u8> = [0, 50, 100, 150, 200, 250, 255, 1]
                .iter()
                .flat_map(|&v| [v, v, v])
                .collect();
            assert_eq!(bytes(&rgb, 0), expected);
        }
    }

    #[test]
    fn test_decode_primary() {
        let mut img = Image::new(2, 2, PixelFormat::NV12, Orientation::TopLeft).unwrap();
        img.fill_plane(0, &[76]).unwrap();
        img.fill_plane(1, &[85, 255]).unwrap();
        let bgra = convert(&img, PixelFormat::BGRA).unwrap();
        for px in bytes(&bgra, 0).chunks_exact(4) {
            assert!(px[2] >= 253 && px[1] <= 2 && px[0] <= 2, "{px:?}");
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_repack_between_yuv_layouts() {
        let mut img = Image::new(4, 2, PixelFormat::J420, Orientation::RightTop).unwrap();
        img.write_row(1, 0, &[10, 11]).unwrap();
        img.write_row(2, 0, &[20, 21]).unwrap();
        let nv12 = convert(&img, PixelFormat::NV12).unwrap();
        assert_eq!(bytes(&nv12, 1), vec![10, 20, 11, 21]);
        assert_eq!(nv12.orientation(), Orientation::RightTop);
        let nv21 = convert(&nv12, PixelFormat::NV21).unwrap();
        assert_eq!(bytes(&nv21, 1), vec![20, 10, 21, 11]);
        let back = convert(&nv21, PixelFormat::J420).unwrap();
        assert_eq!(bytes(&back, 1), vec![10, 11]);
        assert_eq!(bytes(&back, 2), vec![20, 21]);
    }

    #[test]
    fn test_odd_and_empty_sizes() {
        for (w, h) in [(0, 0), (1, 1), (5, 3), (0, 4)] {
            let img = Image::new(w, h, PixelFormat::BGR, Orientation::TopLeft).unwrap();
            for format in PixelFormat::ALL {
                let out = convert(&img, format).unwrap();
                assert_eq!(out.dimensions(), (w, h));
                let back = convert(&out, PixelFormat::BGR).unwrap();
                assert_eq!(back.dimensions(), (w, h));
            }
        }
    }
}
