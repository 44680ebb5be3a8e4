//! EXIF-style orientation and the eight axis-aligned pixel re-layouts.
//!
//! An [`Orientation`] describes how stored pixels map onto the visual frame:
//! `RightTop` (EXIF 6) means the stored pixels must be rotated 90° clockwise
//! to be displayed upright.
//!
//! Each orientation corresponds to a [`Relayout`], an element of the
//! dihedral group of the square. Re-layouts are stored as 2x2 integer
//! matrices acting on centred pixel coordinates (x to the right, y down),
//! so composition and inversion are exact.
//!
//! ```rust
//! use sv_core::{Orientation, Relayout};
//!
//! // Stored upright, wanted as "rotate 180 on display":
//! let r = Orientation::TopLeft.relayout_to(Orientation::BottomRight);
//! assert_eq!(r, Relayout::ROTATE_180);
//! assert_eq!(r.then(r), Relayout::IDENTITY);
//! ```

use std::fmt;

/// EXIF orientation codes 1 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// 1: stored upright.
    #[default]
    TopLeft = 1,
    /// 2: mirrored horizontally.
    TopRight = 2,
    /// 3: rotated 180°.
    BottomRight = 3,
    /// 4: mirrored vertically.
    BottomLeft = 4,
    /// 5: mirrored horizontally and rotated 270° clockwise (transpose).
    LeftTop = 5,
    /// 6: rotated 90° clockwise.
    RightTop = 6,
    /// 7: mirrored horizontally and rotated 90° clockwise (transverse).
    RightBottom = 7,
    /// 8: rotated 270° clockwise.
    LeftBottom = 8,
}

impl Orientation {
    /// All orientations in EXIF order.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
        Self::LeftTop,
        Self::RightTop,
        Self::RightBottom,
        Self::LeftBottom,
    ];

    /// Parses an EXIF orientation value.
    pub const fn from_exif(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::TopLeft),
            2 => Some(Self::TopRight),
            3 => Some(Self::BottomRight),
            4 => Some(Self::BottomLeft),
            5 => Some(Self::LeftTop),
            6 => Some(Self::RightTop),
            7 => Some(Self::RightBottom),
            8 => Some(Self::LeftBottom),
            _ => None,
        }
    }

    /// EXIF orientation value.
    #[inline]
    pub const fn exif(self) -> u8 {
        self as u8
    }

    /// Re-layout mapping stored pixels to the visual frame.
    pub const fn display_transform(self) -> Relayout {
        match self {
            Self::TopLeft => Relayout::IDENTITY,
            Self::TopRight => Relayout::FLIP_H,
            Self::BottomRight => Relayout::ROTATE_180,
            Self::BottomLeft => Relayout::FLIP_V,
            Self::LeftTop => Relayout::TRANSPOSE,
            Self::RightTop => Relayout::ROTATE_90,
            Self::RightBottom => Relayout::TRANSVERSE,
            Self::LeftBottom => Relayout::ROTATE_270,
        }
    }

    /// Re-layout that turns pixels stored with `self` into pixels stored
    /// with `dst`, keeping the visual content unchanged.
    #[inline]
    pub const fn relayout_to(self, dst: Orientation) -> Relayout {
        self.display_transform().then(dst.display_transform().inverse())
    }

    /// Returns `true` if the stored width is the visual height.
    #[inline]
    pub const fn swaps_axes(self) -> bool {
        self.display_transform().swaps_axes()
    }

    /// Short corner code as used by TIFF (`TL`, `TR`, ...).
    pub const fn code(self) -> &'static str {
        match self {
            Self::TopLeft => "TL",
            Self::TopRight => "TR",
            Self::BottomRight => "BR",
            Self::BottomLeft => "BL",
            Self::LeftTop => "LT",
            Self::RightTop => "RT",
            Self::RightBottom => "RB",
            Self::LeftBottom => "LB",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code(), self.exif())
    }
}

/// One of the eight axis-aligned pixel re-layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relayout {
    m: [[i8; 2]; 2],
}

impl Relayout {
    /// No change.
    pub const IDENTITY: Self = Self::new([[1, 0], [0, 1]]);
    /// Mirror left-right.
    pub const FLIP_H: Self = Self::new([[-1, 0], [0, 1]]);
    /// Mirror top-bottom.
    pub const FLIP_V: Self = Self::new([[1, 0], [0, -1]]);
    /// Rotate 180°.
    pub const ROTATE_180: Self = Self::new([[-1, 0], [0, -1]]);
    /// Swap axes about the main diagonal.
    pub const TRANSPOSE: Self = Self::new([[0, 1], [1, 0]]);
    /// Swap axes about the anti-diagonal.
    pub const TRANSVERSE: Self = Self::new([[0, -1], [-1, 0]]);
    /// Rotate 90° clockwise.
    pub const ROTATE_90: Self = Self::new([[0, -1], [1, 0]]);
    /// Rotate 270° clockwise.
    pub const ROTATE_270: Self = Self::new([[0, 1], [-1, 0]]);

    const fn new(m: [[i8; 2]; 2]) -> Self {
        Self { m }
    }

    /// Applies `self` first, then `next`.
    pub const fn then(self, next: Relayout) -> Relayout {
        let a = next.m;
        let b = self.m;
        Self::new([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }

    /// Inverse re-layout. The matrices are orthogonal, so this is the transpose.
    pub const fn inverse(self) -> Relayout {
        let m = self.m;
        Self::new([[m[0][0], m[1][0]], [m[0][1], m[1][1]]])
    }

    /// Returns `true` for the four re-layouts that exchange width and height.
    #[inline]
    pub const fn swaps_axes(self) -> bool {
        self.m[0][0] == 0
    }

    /// Output dimensions for an input of `width`x`height`.
    #[inline]
    pub const fn output_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Input pixel that lands on output pixel `(x, y)`.
    ///
    /// `src_width`/`src_height` are the input dimensions; `(x, y)` must lie
    /// inside [`output_size`](Self::output_size).
    pub fn source_pixel(self, x: u32, y: u32, src_width: u32, src_height: u32) -> (u32, u32) {
        let (out_w, out_h) = self.output_size(src_width, src_height);
        // Doubled centred coordinates keep everything integral.
        let ox = 2 * i64::from(x) - (i64::from(out_w) - 1);
        let oy = 2 * i64::from(y) - (i64::from(out_h) - 1);
        let m = self.m;
        let ix = i64::from(m[0][0]) * ox + i64::from(m[1][0]) * oy;
        let iy = i64::from(m[0][1]) * ox + i64::from(m[1][1]) * oy;
        let sx = (ix + i64::from(src_width) - 1) / 2;
        let sy = (iy + i64::from(src_height) - 1) / 2;
        (sx as u32, sy as u32)
    }
}
