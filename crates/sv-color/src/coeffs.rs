//! BT.601 full-range (JFIF) coefficients in 16-bit fixed point.
//!
//! Every RGB <-> YCbCr conversion in this crate goes through the functions
//! below, so results are bit-exact everywhere:
//!
//! ```text
//! Y  = ( 19595 R + 38470 G +  7471 B + 32768) >> 16
//! Cb = ((-11059 R - 21709 G + 32768 B + 32768) >> 16) + 128
//! Cr = (( 32768 R - 27439 G -  5329 B + 32768) >> 16) + 128
//!
//! R = Y + (( 91881 Cr' + 32768) >> 16)
//! G = Y + ((-22554 Cb' - 46802 Cr' + 32768) >> 16)
//! B = Y + ((116130 Cb' + 32768) >> 16)          Cb' = Cb - 128, Cr' = Cr - 128
//! ```
//!
//! Shifts are arithmetic (rounding toward negative infinity) and every
//! result is clamped to `0..=255`.

/// Luma weight of red.
pub const Y_R: i32 = 19595;
/// Luma weight of green.
pub const Y_G: i32 = 38470;
/// Luma weight of blue.
pub const Y_B: i32 = 7471;

/// Cb weight of red.
pub const CB_R: i32 = -11059;
/// Cb weight of green.
pub const CB_G: i32 = -21709;
/// Cb weight of blue.
pub const CB_B: i32 = 32768;

/// Cr weight of red.
pub const CR_R: i32 = 32768;
/// Cr weight of green.
pub const CR_G: i32 = -27439;
/// Cr weight of blue.
pub const CR_B: i32 = -5329;

/// Red from Cr'.
pub const R_CR: i32 = 91881;
/// Green from Cb'.
pub const G_CB: i32 = -22554;
/// Green from Cr'.
pub const G_CR: i32 = -46802;
/// Blue from Cb'.
pub const B_CB: i32 = 116130;

const HALF: i32 = 1 << 15;

#[inline]
const fn clamp_u8(v: i32) -> u8 {
    if v < 0 {
        0
    } else if v > 255 {
        255
    } else {
        v as u8
    }
}

/// Luma of an RGB triple. Gray inputs map to themselves.
#[inline]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    clamp_u8((Y_R * r + Y_G * g + Y_B * b + HALF) >> 16)
}

/// Full-range YCbCr of an RGB triple.
#[inline]
pub const fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (ri, gi, bi) = (r as i32, g as i32, b as i32);
    let cb = ((CB_R * ri + CB_G * gi + CB_B * bi + HALF) >> 16) + 128;
    let cr = ((CR_R * ri + CR_G * gi + CR_B * bi + HALF) >> 16) + 128;
    [luma(r, g, b), clamp_u8(cb), clamp_u8(cr)]
}

/// RGB of a full-range YCbCr triple.
#[inline]
pub const fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = y as i32;
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;
    let r = y + ((R_CR * cr + HALF) >> 16);
    let g = y + ((G_CB * cb + G_CR * cr + HALF) >> 16);
    let b = y + ((B_CB * cb + HALF) >> 16);
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}
