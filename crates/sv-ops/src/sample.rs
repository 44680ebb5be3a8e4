//! Sampling kernels shared by resize and warp.
//!
//! Interpolation runs in integer arithmetic: fractional positions are
//! quantized to [`FRAC_BITS`] bits and blended with rounding, so outputs are
//! identical across platforms and thread counts.

use sv_core::{PixelFormat, PlaneBuf};

/// Fractional bits of bilinear weights.
pub const FRAC_BITS: u32 = 11;

const ONE: i32 = 1 << FRAC_BITS;
const ROUND: i32 = 1 << (2 * FRAC_BITS - 1);

/// Resampling kernel for resize and warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Nearest-neighbor (no blending).
    Nearest,
    /// Bilinear blend of the four neighbours.
    #[default]
    Bilinear,
}

/// Value written where no source sample exists.
///
/// Black for luma and packed planes, neutral (128) for chroma planes.
#[inline]
pub fn fill_value(format: PixelFormat, plane: usize) -> u8 {
    if plane > 0 && format.layout().kind.is_subsampled() {
        128
    } else {
        0
    }
}

/// Quantizes a fraction in `[0, 1]` to an integer weight.
#[inline]
pub(crate) fn quantize(frac: f64) -> i32 {
    ((frac * f64::from(ONE)).round() as i32).clamp(0, ONE)
}

/// Integer source position and weight of the right/lower neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tap {
    pub lo: u32,
    pub hi: u32,
    pub weight: i32,
}

impl Tap {
    /// Tap for a source coordinate already known to lie in `[0, len - 1]`.
    #[inline]
    pub fn at(pos: f64, len: u32, interp: Interpolation) -> Self {
        let last = len.saturating_sub(1);
        match interp {
            Interpolation::Nearest => {
                let p = (pos.round().max(0.0) as u32).min(last);
                Self {
                    lo: p,
                    hi: p,
                    weight: 0,
                }
            }
            Interpolation::Bilinear => {
                let lo = (pos.floor().max(0.0) as u32).min(last);
                let hi = (lo + 1).min(last);
                Self {
                    lo,
                    hi,
                    weight: quantize(pos - f64::from(lo)),
                }
            }
        }
    }
}

/// Blends one channel of four neighbours.
#[inline]
pub(crate) fn blend(p00: u8, p10: u8, p01: u8, p11: u8, wx: i32, wy: i32) -> u8 {
    let top = i32::from(p00) * (ONE - wx) + i32::from(p10) * wx;
    let bot = i32::from(p01) * (ONE - wx) + i32::from(p11) * wx;
    ((top * (ONE - wy) + bot * wy + ROUND) >> (2 * FRAC_BITS)) as u8
}

/// Writes the sample at `(tx, ty)` of `src` into `out`.
#[inline]
pub(crate) fn sample_into(src: &PlaneBuf, tx: Tap, ty: Tap, out: &mut [u8]) {
    if tx.weight == 0 && ty.weight == 0 {
        out.copy_from_slice(src.get(tx.lo, ty.lo));
        return;
    }
    let p00 = src.get(tx.lo, ty.lo);
    let p10 = src.get(tx.hi, ty.lo);
    let p01 = src.get(tx.lo, ty.hi);
    let p11 = src.get(tx.hi, ty.hi);
    for (c, o) in out.iter_mut().enumerate() {
        *o = blend(p00[c], p10[c], p01[c], p11[c], tx.weight, ty.weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_core::PlaneExtent;

    fn tap(lo: u32, hi: u32, weight: i32) -> Tap {
        Tap { lo, hi, weight }
    }

    #[test]
    fn test_blend_endpoints() {
        assert_eq!(blend(10, 200, 30, 40, 0, 0), 10);
        assert_eq!(blend(10, 200, 30, 40, ONE, 0), 200);
        assert_eq!(blend(10, 200, 30, 40, 0, ONE), 30);
        assert_eq!(blend(10, 200, 30, 40, ONE, ONE), 40);
        assert_eq!(blend(0, 255, 0, 255, ONE / 2, 0), 128);
        assert_eq!(blend(255, 255, 255, 255, 777, 1234), 255);
    }

    #[test]
    fn test_tap() {
        assert_eq!(Tap::at(2.0, 4, Interpolation::Bilinear), tap(2, 3, 0));
        assert_eq!(Tap::at(3.0, 4, Interpolation::Bilinear), tap(3, 3, 0));
        assert_eq!(Tap::at(1.5, 4, Interpolation::Bilinear).weight, ONE / 2);
        assert_eq!(Tap::at(1.5, 4, Interpolation::Nearest).lo, 2);
        assert_eq!(Tap::at(1.4, 4, Interpolation::Nearest).lo, 1);
    }

    #[test]
    fn test_fill_value() {
        assert_eq!(fill_value(PixelFormat::NV12, 0), 0);
        assert_eq!(fill_value(PixelFormat::NV12, 1), 128);
        assert_eq!(fill_value(PixelFormat::J420, 2), 128);
        assert_eq!(fill_value(PixelFormat::BGRA, 0), 0);
    }

    #[test]
    fn test_sample_into() {
        let ext = PlaneExtent {
            width: 2,
            height: 1,
            bytes_per_pixel: 2,
        };
        let src = PlaneBuf::from_vec(ext, vec![0, 100, 200, 0]).unwrap();
        let mut out = [0u8; 2];
        let tx = tap(0, 1, ONE / 2);
        let ty = tap(0, 0, 0);
        sample_into(&src, tx, ty, &mut out);
        assert_eq!(out, [100, 50]);
    }
}
