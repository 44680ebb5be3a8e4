//! 4:2:0 chroma resampling.
//!
//! Chroma planes here are single-channel (`bytes_per_pixel == 1`). Semi-planar
//! formats are split into separate Cb and Cr planes before resampling.

use sv_core::{PlaneBuf, PlaneExtent, Result};

/// How subsampled chroma is brought back to full resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChromaUpsampling {
    /// Every chroma sample covers its 2x2 luma block.
    #[default]
    Nearest,
    /// Centred 9:3:3:1 blend of the four nearest chroma samples.
    Bilinear,
}

/// Averages each 2x2 block of `full` into one sample, rounding half up.
///
/// Blocks cut off at odd right/bottom edges average only the samples they
/// contain.
pub fn downsample_box(full: &PlaneBuf) -> Result<PlaneBuf> {
    let extent = PlaneExtent {
        width: full.width().div_ceil(2),
        height: full.height().div_ceil(2),
        bytes_per_pixel: 1,
    };
    let mut half = PlaneBuf::new(extent)?;
    let (w, h) = (full.width(), full.height());
    half.for_each_row(|cy, row| {
        let y0 = cy * 2;
        let y1 = (y0 + 1).min(h - 1);
        for (cx, out) in row.iter_mut().enumerate() {
            let x0 = cx as u32 * 2;
            let x1 = (x0 + 1).min(w - 1);
            let mut sum = 0u32;
            let mut n = 0u32;
            for y in y0..=y1 {
                for x in x0..=x1 {
                    sum += u32::from(full.get(x, y)[0]);
                    n += 1;
                }
            }
            *out = ((sum + n / 2) / n) as u8;
        }
    });
    Ok(half)
}

/// Expands a subsampled plane to `width`x`height`.
pub fn upsample(
    half: &PlaneBuf,
    width: u32,
    height: u32,
    mode: ChromaUpsampling,
) -> Result<PlaneBuf> {
    let extent = PlaneExtent {
        width,
        height,
        bytes_per_pixel: 1,
    };
    if half.is_empty() {
        return PlaneBuf::filled(extent, 128);
    }
    let mut full = PlaneBuf::new(extent)?;
    let last_x = i64::from(half.width()) - 1;
    let last_y = i64::from(half.height()) - 1;
    full.for_each_row(|y, row| {
        let near_y = i64::from(y / 2);
        // Even rows sit a quarter sample below the previous chroma row.
        let far_y = (if y % 2 == 0 { near_y - 1 } else { near_y + 1 }).clamp(0, last_y);
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as u32;
            let near_x = i64::from(x / 2);
            *out = match mode {
                ChromaUpsampling::Nearest => half.get_clamped(near_x, near_y)[0],
                ChromaUpsampling::Bilinear => {
                    let far_x = (if x % 2 == 0 { near_x - 1 } else { near_x + 1 }).clamp(0, last_x);
                    let nn = u32::from(half.get_clamped(near_x, near_y)[0]);
                    let fn_ = u32::from(half.get_clamped(far_x, near_y)[0]);
                    let nf = u32::from(half.get_clamped(near_x, far_y)[0]);
                    let ff = u32::from(half.get_clamped(far_x, far_y)[0]);
                    ((9 * nn + 3 * fn_ + 3 * nf + ff + 8) >> 4) as u8
                }
            };
        }
    });
    Ok(full)
}
