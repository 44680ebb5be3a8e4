//! Tightly packed scratch planes.
//!
//! Kernels in `sv-ops` and `sv-color` never touch strided storage directly:
//! they read a plane out of an [`crate::Image`] into a [`PlaneBuf`], work on
//! plain `u8` rows with [`PlaneBuf::for_each_row`], and write the result
//! back into a fresh image.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::buffer::try_vec;
use crate::format::PlaneExtent;
use crate::{Error, Result};

/// One image plane with stride equal to its row size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneBuf {
    extent: PlaneExtent,
    data: Vec<u8>,
}

impl PlaneBuf {
    /// Zero-filled plane.
    pub fn new(extent: PlaneExtent) -> Result<Self> {
        Self::filled(extent, 0)
    }

    /// Plane with every byte set to `value`.
    pub fn filled(extent: PlaneExtent, value: u8) -> Result<Self> {
        let len = extent.size();
        let mut data = try_vec(len)?;
        data.resize(len, value);
        Ok(Self { extent, data })
    }

    /// Wraps existing bytes. `data` must be exactly `extent.size()` long.
    pub fn from_vec(extent: PlaneExtent, data: Vec<u8>) -> Result<Self> {
        if data.len() != extent.size() {
            return Err(Error::shape_mismatch(format!(
                "plane of {}x{}x{} needs {} bytes, got {}",
                extent.width,
                extent.height,
                extent.bytes_per_pixel,
                extent.size(),
                data.len()
            )));
        }
        Ok(Self { extent, data })
    }

    /// Plane dimensions and sample size.
    #[inline]
    pub fn extent(&self) -> PlaneExtent {
        self.extent
    }

    /// Width in samples.
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Bytes per sample.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.extent.bytes_per_pixel
    }

    /// Bytes per row, also the stride.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.extent.row_bytes()
    }

    /// Returns `true` if the plane holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `y`. Panics if `y` is out of range.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let rb = self.row_bytes();
        let start = y as usize * rb;
        &self.data[start..start + rb]
    }

    /// Mutable row `y`. Panics if `y` is out of range.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let rb = self.row_bytes();
        let start = y as usize * rb;
        &mut self.data[start..start + rb]
    }

    /// Sample at `(x, y)`, `bytes_per_pixel` bytes long.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.bytes_per_pixel();
        let start = y as usize * self.row_bytes() + x as usize * bpp;
        &self.data[start..start + bpp]
    }

    /// Sample with coordinates clamped to the plane. The plane must not be empty.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> &[u8] {
        let x = x.clamp(0, i64::from(self.width()) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height()) - 1) as u32;
        self.get(x, y)
    }

    /// All rows, top to bottom.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to all rows.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the plane, returning its bytes.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Calls `f(y, row)` for every row.
    ///
    /// With the `parallel` feature rows are distributed over the rayon pool.
    /// `f` only ever sees one row, so the result does not depend on the
    /// number of threads.
    #[cfg(feature = "parallel")]
    pub fn for_each_row<F>(&mut self, f: F)
    where
        F: Fn(u32, &mut [u8]) + Sync + Send,
    {
        let row_bytes = self.row_bytes();
        if row_bytes == 0 {
            return;
        }
        self.data
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| f(y as u32, row));
    }

    /// Calls `f(y, row)` for every row (single-threaded fallback).
    #[cfg(not(feature = "parallel"))]
    pub fn for_each_row<F>(&mut self, f: F)
    where
        F: Fn(u32, &mut [u8]) + Sync + Send,
    {
        let row_bytes = self.row_bytes();
        if row_bytes == 0 {
            return;
        }
        self.data
            .chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| f(y as u32, row));
    }
}
