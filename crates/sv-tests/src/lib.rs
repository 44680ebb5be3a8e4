//! Integration tests for sv crates.
//!
//! This crate contains end-to-end tests that exercise buffers, geometric
//! operations and format conversion together, plus the pattern fixtures
//! they share.

use sv_core::{Image, Orientation, PixelFormat};

/// Deterministic non-constant pattern in every plane of `format`.
///
/// Each byte depends on plane, row and byte offset, so mix-ups between
/// planes, rows or channels show up as mismatches.
pub fn pattern(width: u32, height: u32, format: PixelFormat) -> sv_core::Result<Image> {
    let mut img = Image::new(width, height, format, Orientation::TopLeft)?;
    for plane in 0..img.plane_count() {
        let ext = img.plane_extent(plane);
        for y in 0..ext.height {
            let row: Vec<u8> = (0..ext.row_bytes())
                .map(|i| (i as u32 * 7 + y * 31 + plane as u32 * 101) as u8)
                .collect();
            img.write_row(plane, y, &row)?;
        }
    }
    Ok(img)
}

/// Packed image where every pixel holds the same bytes.
pub fn solid(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> sv_core::Result<Image> {
    let mut img = Image::new(width, height, format, Orientation::TopLeft)?;
    img.fill_plane(0, pixel)?;
    Ok(img)
}

/// Returns `true` if both images hold identical pixel bytes in every plane.
pub fn same_pixels(a: &Image, b: &Image) -> bool {
    a.format() == b.format()
        && a.dimensions() == b.dimensions()
        && (0..a.plane_count()).all(|plane| match (a.read_plane(plane), b.read_plane(plane)) {
            (Ok(pa), Ok(pb)) => pa == pb,
            _ => false,
        })
}
