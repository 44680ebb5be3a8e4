//! Pixel format descriptors and plane layout arithmetic.
//!
//! A [`PixelFormat`] packs a format id and three per-plane bit counts into a
//! single `u32`. The bit layout is a compatibility contract and must not
//! change:
//!
//! ```text
//! 0        8        16       24       32
//! | plane0 | plane1 | plane2 |   id   |
//! ```
//!
//! Bit counts of chroma planes in subsampled formats are expressed per
//! *luma* pixel: J420 stores 2 bits per luma pixel in each chroma plane
//! (one byte per chroma sample at quarter area), NV12 stores 4 bits per luma
//! pixel in its interleaved chroma plane (two bytes per chroma sample).
//!
//! # Usage
//!
//! ```rust
//! use sv_core::{LayoutKind, PixelFormat};
//!
//! let fmt = PixelFormat::NV12;
//! assert_eq!(fmt.layout().kind, LayoutKind::SemiPlanar2Subsampled);
//!
//! // Chroma plane of a 5x3 NV12 image: 3x2 samples, 2 bytes each.
//! let ext = fmt.plane_extent(1, 5, 3);
//! assert_eq!((ext.width, ext.height, ext.bytes_per_pixel), (3, 2, 2));
//! assert_eq!(fmt.minimal_stride(1, 5), 6);
//! ```
//!
//! Descriptors that are not one of the canonical constants are accepted
//! everywhere in this module. Unknown ids classify as id 0: a packed single
//! plane whose sample size is derived from the plane-0 bit count. That
//! behaviour is degenerate but never fails.

use std::fmt;

/// Maximum number of planes any format uses.
pub const MAX_PLANES: usize = 3;

/// Opaque 32-bit pixel format descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PixelFormat(u32);

impl PixelFormat {
    /// 8-bit grayscale, one plane.
    pub const GRAY8: Self = Self::encode(0, 8, 0, 0);
    /// Packed B, G, R bytes.
    pub const BGR: Self = Self::encode(1, 24, 0, 0);
    /// Packed B, G, R, A bytes.
    pub const BGRA: Self = Self::encode(2, 32, 0, 0);
    /// Packed R, G, B bytes.
    pub const RGB: Self = Self::encode(3, 24, 0, 0);
    /// Packed R, G, B, A bytes.
    pub const RGBA: Self = Self::encode(4, 32, 0, 0);
    /// Full-range YCbCr 4:2:0, three planes (Y, Cb, Cr).
    pub const J420: Self = Self::encode(5, 8, 2, 2);
    /// YCbCr 4:2:0, luma plane plus interleaved Cb/Cr plane.
    pub const NV12: Self = Self::encode(6, 8, 4, 0);
    /// YCbCr 4:2:0, luma plane plus interleaved Cr/Cb plane.
    pub const NV21: Self = Self::encode(7, 8, 4, 0);

    /// All canonical formats, in id order.
    pub const ALL: [Self; 8] = [
        Self::GRAY8,
        Self::BGR,
        Self::BGRA,
        Self::RGB,
        Self::RGBA,
        Self::J420,
        Self::NV12,
        Self::NV21,
    ];

    /// Packs a format id and per-plane bit counts into a descriptor.
    #[inline]
    pub const fn encode(id: u8, bpp0: u8, bpp1: u8, bpp2: u8) -> Self {
        Self((bpp0 as u32) | ((bpp1 as u32) << 8) | ((bpp2 as u32) << 16) | ((id as u32) << 24))
    }

    /// Reinterprets raw descriptor bits. Every `u32` is accepted.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw descriptor bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the encoded format id (top byte).
    #[inline]
    pub const fn id(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns the encoded bit count of `plane`, or 0 for planes past [`MAX_PLANES`].
    #[inline]
    pub const fn plane_bits(self, plane: usize) -> u8 {
        if plane >= MAX_PLANES {
            0
        } else {
            (self.0 >> (plane * 8)) as u8
        }
    }

    /// Returns the canonical format this descriptor equals, if any.
    #[inline]
    pub fn kind(self) -> Option<FormatKind> {
        FormatKind::from_format(self)
    }

    /// Returns `true` if the descriptor is one of the canonical constants.
    #[inline]
    pub fn is_canonical(self) -> bool {
        self.kind().is_some()
    }

    /// Classifies the plane layout. Unknown ids classify as packed.
    pub const fn layout(self) -> FormatLayout {
        match self.id() {
            5 => FormatLayout {
                plane_count: 3,
                kind: LayoutKind::Planar3Subsampled,
            },
            6 | 7 => FormatLayout {
                plane_count: 2,
                kind: LayoutKind::SemiPlanar2Subsampled,
            },
            _ => FormatLayout {
                plane_count: 1,
                kind: LayoutKind::Packed,
            },
        }
    }

    /// Number of active planes.
    #[inline]
    pub const fn plane_count(self) -> usize {
        self.layout().plane_count
    }

    /// Horizontal and vertical subsampling divisors of `plane`.
    #[inline]
    pub const fn subsampling(self, plane: usize) -> (u32, u32) {
        if plane > 0 && self.layout().kind.is_subsampled() {
            (2, 2)
        } else {
            (1, 1)
        }
    }

    /// Dimensions and sample size of `plane` for a `width`x`height` image.
    ///
    /// Plane 0 is always full resolution. Chroma planes of subsampled
    /// layouts are `ceil(width/2)`x`ceil(height/2)`. Inactive planes have a
    /// zero extent.
    pub const fn plane_extent(self, plane: usize, width: u32, height: u32) -> PlaneExtent {
        if plane >= self.plane_count() {
            return PlaneExtent::EMPTY;
        }
        let bits = self.plane_bits(plane) as usize;
        if plane == 0 {
            return PlaneExtent {
                width,
                height,
                bytes_per_pixel: bits.div_ceil(8),
            };
        }
        // Four luma pixels share one chroma sample.
        PlaneExtent {
            width: width.div_ceil(2),
            height: height.div_ceil(2),
            bytes_per_pixel: (bits * 4).div_ceil(8),
        }
    }

    /// Smallest valid row stride of `plane` in bytes.
    #[inline]
    pub const fn minimal_stride(self, plane: usize, width: u32) -> usize {
        self.plane_extent(plane, width, 1).row_bytes()
    }

    /// Tightly-packed byte size of a `width`x`height` image, or `None` on overflow.
    pub fn logical_size(self, width: u32, height: u32) -> Option<usize> {
        (0..self.plane_count()).try_fold(0usize, |acc, plane| {
            let ext = self.plane_extent(plane, width, height);
            (ext.width as usize)
                .checked_mul(ext.bytes_per_pixel)?
                .checked_mul(ext.height as usize)
                .and_then(|size| acc.checked_add(size))
        })
    }

    /// Diagnostic label. Never used for comparisons.
    pub fn name(self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.name(),
            None => "UNKNOWN",
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::GRAY8
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({} 0x{:08x})", self.name(), self.0)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FormatKind> for PixelFormat {
    fn from(kind: FormatKind) -> Self {
        kind.format()
    }
}

/// Plane arrangement of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// One interleaved plane.
    Packed,
    /// Luma plus two half-resolution chroma planes.
    Planar3Subsampled,
    /// Luma plus one half-resolution interleaved chroma plane.
    SemiPlanar2Subsampled,
}

impl LayoutKind {
    /// Returns `true` for 4:2:0 layouts.
    #[inline]
    pub const fn is_subsampled(self) -> bool {
        !matches!(self, Self::Packed)
    }
}

/// Result of classifying a [`PixelFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatLayout {
    /// Number of active planes (1..=3).
    pub plane_count: usize,
    /// Plane arrangement.
    pub kind: LayoutKind,
}

/// Dimensions of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaneExtent {
    /// Samples per row
    pub width: u32,
    /// Rows
    pub height: u32,
    /// Bytes per sample
    pub bytes_per_pixel: usize,
}

impl PlaneExtent {
    /// Extent of an inactive plane.
    pub const EMPTY: Self = Self {
        width: 0,
        height: 0,
        bytes_per_pixel: 0,
    };

    /// Tightly-packed row size in bytes.
    #[inline]
    pub const fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }

    /// Tightly-packed plane size in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.row_bytes() * self.height as usize
    }
}

/// The canonical pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// [`PixelFormat::GRAY8`]
    Gray8,
    /// [`PixelFormat::BGR`]
    Bgr,
    /// [`PixelFormat::BGRA`]
    Bgra,
    /// [`PixelFormat::RGB`]
    Rgb,
    /// [`PixelFormat::RGBA`]
    Rgba,
    /// [`PixelFormat::J420`]
    J420,
    /// [`PixelFormat::NV12`]
    Nv12,
    /// [`PixelFormat::NV21`]
    Nv21,
}

impl FormatKind {
    /// Exact match against the canonical descriptors.
    pub fn from_format(format: PixelFormat) -> Option<Self> {
        Some(match format {
            PixelFormat::GRAY8 => Self::Gray8,
            PixelFormat::BGR => Self::Bgr,
            PixelFormat::BGRA => Self::Bgra,
            PixelFormat::RGB => Self::Rgb,
            PixelFormat::RGBA => Self::Rgba,
            PixelFormat::J420 => Self::J420,
            PixelFormat::NV12 => Self::Nv12,
            PixelFormat::NV21 => Self::Nv21,
            _ => return None,
        })
    }

    /// Canonical descriptor.
    pub const fn format(self) -> PixelFormat {
        match self {
            Self::Gray8 => PixelFormat::GRAY8,
            Self::Bgr => PixelFormat::BGR,
            Self::Bgra => PixelFormat::BGRA,
            Self::Rgb => PixelFormat::RGB,
            Self::Rgba => PixelFormat::RGBA,
            Self::J420 => PixelFormat::J420,
            Self::Nv12 => PixelFormat::NV12,
            Self::Nv21 => PixelFormat::NV21,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gray8 => "GRAY8",
            Self::Bgr => "BGR",
            Self::Bgra => "BGRA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::J420 => "J420",
            Self::Nv12 => "NV12",
            Self::Nv21 => "NV21",
        }
    }

    /// Returns `true` for single-plane formats.
    #[inline]
    pub const fn is_packed(self) -> bool {
        matches!(
            self,
            Self::Gray8 | Self::Bgr | Self::Bgra | Self::Rgb | Self::Rgba
        )
    }

    /// Returns `true` for the YCbCr 4:2:0 formats.
    #[inline]
    pub const fn is_yuv(self) -> bool {
        !self.is_packed()
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        assert_eq!(PixelFormat::GRAY8.bits(), 0x0000_0008);
        assert_eq!(PixelFormat::BGR.bits(), 0x0100_0018);
        assert_eq!(PixelFormat::J420.bits(), 0x0502_0208);
        assert_eq!(PixelFormat::NV21.bits(), 0x0700_0408);

        let fmt = PixelFormat::encode(5, 8, 2, 2);
        assert_eq!(fmt, PixelFormat::J420);
        assert_eq!(fmt.id(), 5);
        assert_eq!(fmt.plane_bits(0), 8);
        assert_eq!(fmt.plane_bits(1), 2);
        assert_eq!(fmt.plane_bits(2), 2);
        assert_eq!(fmt.plane_bits(3), 0);
        assert_eq!(PixelFormat::from_bits(fmt.bits()), fmt);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            PixelFormat::RGBA.layout(),
            FormatLayout {
                plane_count: 1,
                kind: LayoutKind::Packed
            }
        );
        assert_eq!(PixelFormat::J420.layout().kind, LayoutKind::Planar3Subsampled);
        assert_eq!(PixelFormat::J420.plane_count(), 3);
        assert_eq!(PixelFormat::NV12.layout().kind, LayoutKind::SemiPlanar2Subsampled);
        assert_eq!(PixelFormat::NV21.plane_count(), 2);
    }

    #[test]
    fn test_unknown_format_is_gray_like() {
        let odd = PixelFormat::from_bits(0xEE00_0010);
        assert_eq!(odd.kind(), None);
        assert_eq!(odd.layout().kind, LayoutKind::Packed);
        assert_eq!(odd.plane_count(), 1);
        assert_eq!(odd.plane_extent(0, 3, 2).bytes_per_pixel, 2);
        assert_eq!(odd.name(), "UNKNOWN");
    }

    #[test]
    fn test_plane_extent() {
        let ext = PixelFormat::BGR.plane_extent(0, 7, 5);
        assert_eq!((ext.width, ext.height, ext.bytes_per_pixel), (7, 5, 3));
        assert_eq!(PixelFormat::BGR.plane_extent(1, 7, 5), PlaneExtent::EMPTY);

        let ext = PixelFormat::J420.plane_extent(2, 7, 5);
        assert_eq!((ext.width, ext.height, ext.bytes_per_pixel), (4, 3, 1));

        let ext = PixelFormat::NV12.plane_extent(1, 4, 4);
        assert_eq!((ext.width, ext.height, ext.bytes_per_pixel), (2, 2, 2));
    }

    #[test]
    fn test_minimal_stride() {
        assert_eq!(PixelFormat::GRAY8.minimal_stride(0, 4), 4);
        assert_eq!(PixelFormat::BGRA.minimal_stride(0, 3), 12);
        assert_eq!(PixelFormat::J420.minimal_stride(1, 5), 3);
        assert_eq!(PixelFormat::NV21.minimal_stride(1, 5), 6);
    }

    #[test]
    fn test_logical_size() {
        assert_eq!(PixelFormat::GRAY8.logical_size(4, 4), Some(16));
        assert_eq!(PixelFormat::RGB.logical_size(2, 2), Some(12));
        // 5x3: luma 15, chroma 3x2 each
        assert_eq!(PixelFormat::J420.logical_size(5, 3), Some(15 + 6 + 6));
        assert_eq!(PixelFormat::NV12.logical_size(5, 3), Some(15 + 12));
        assert_eq!(PixelFormat::NV12.logical_size(0, 0), Some(0));
    }

    #[test]
    fn test_names() {
        assert_eq!(PixelFormat::NV12.to_string(), "NV12");
        assert!(format!("{:?}", PixelFormat::BGRA).contains("0x02000020"));
        for fmt in PixelFormat::ALL {
            assert_eq!(fmt.kind().map(FormatKind::format), Some(fmt));
        }
    }
}
