//! The image handle.
//!
//! An [`Image`] is a small descriptor (dimensions, [`PixelFormat`],
//! [`Orientation`], per-plane offset and stride) plus an [`Ownership`] tag
//! naming where the bytes live.
//!
//! # Memory Layout
//!
//! Owned images keep every plane in one contiguous allocation, planes
//! back to back in index order:
//!
//! ```text
//! NV12 5x3, minimal strides:
//!   offset 0   [Y Y Y Y Y]          ← luma, stride 5
//!              [Y Y Y Y Y]
//!              [Y Y Y Y Y]
//!   offset 15  [U V U V U V]        ← chroma, 3x2 samples of 2 bytes
//!              [U V U V U V]
//! ```
//!
//! Rows may be padded past their minimal length; readers must always step
//! by the plane stride.
//!
//! # Views and copies
//!
//! [`Image::view`] returns another handle onto the same storage: writes
//! through either handle are visible through the other. Everything else
//! that returns an image ([`Image::deep_clone`] and every transform in
//! `sv-ops` and `sv-color`) allocates fresh storage.
//!
//! ```rust
//! use sv_core::{Image, Orientation, PixelFormat, Rect};
//!
//! let img = Image::new(4, 4, PixelFormat::GRAY8, Orientation::TopLeft)?;
//! let mut roi = img.view(Rect::new(1, 1, 2, 2))?;
//! roi.set_sample(0, 0, 0, &[200])?;
//! assert_eq!(img.sample(0, 1, 1)?.as_slice(), &[200]);
//! assert_eq!(img.ref_count(), Some(2));
//! # Ok::<(), sv_core::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use smallvec::SmallVec;

use crate::buffer::{ExternalMemory, Ownership, PixelBuffer};
use crate::format::{MAX_PLANES, PixelFormat, PlaneExtent};
use crate::orientation::Orientation;
use crate::plane::PlaneBuf;
use crate::rect::Rect;
use crate::{Error, Result};

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// One sample, at most the size of a BGRA pixel without spilling.
pub type Sample = SmallVec<[u8; 4]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PlaneLayout {
    offset: usize,
    stride: usize,
}

/// Caller memory for one plane, passed to [`Image::wrap_external`].
#[derive(Debug, Clone, Copy)]
pub struct ExternalPlane {
    /// First byte of the plane's top row.
    pub ptr: *mut u8,
    /// Bytes addressable from `ptr`.
    pub len: usize,
    /// Row stride in bytes; `None` means the minimal stride.
    pub stride: Option<usize>,
}

impl ExternalPlane {
    /// Plane at minimal stride.
    pub fn new(ptr: *mut u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            stride: None,
        }
    }

    /// Plane covering `data`.
    pub fn from_slice(data: &mut [u8]) -> Self {
        Self::new(data.as_mut_ptr(), data.len())
    }

    /// Sets an explicit row stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }
}

/// Options for the named wrapping constructors such as [`Image::from_bgr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapOptions {
    /// Row stride in bytes. Default: the minimal stride of the format.
    pub stride: Option<usize>,
    /// Stored orientation. Default: [`Orientation::TopLeft`].
    pub orientation: Orientation,
}

impl WrapOptions {
    /// Options with an explicit stride.
    pub fn with_stride(stride: usize) -> Self {
        Self {
            stride: Some(stride),
            ..Self::default()
        }
    }

    /// Sets the stored orientation.
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Image handle: descriptor plus owned or external storage.
///
/// Dropping an owned handle releases one reference to the shared
/// allocation, which is freed with the last reference. Dropping an external
/// handle never touches the wrapped memory.
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    orientation: Orientation,
    planes: [PlaneLayout; MAX_PLANES],
    ownership: Ownership,
}

/// Rejects widths or heights above [`MAX_DIMENSION`].
///
/// Every constructor applies this check; operations that size their output
/// from caller-supplied dimensions apply it before allocating anything.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::invalid_dimensions(
            width,
            height,
            format!("dimensions above {MAX_DIMENSION}"),
        ));
    }
    Ok(())
}

/// Minimal stride of `plane`, computed without wrapping.
fn min_stride(format: PixelFormat, plane: usize, width: u32) -> Result<usize> {
    let ext = format.plane_extent(plane, width, 1);
    (ext.width as usize)
        .checked_mul(ext.bytes_per_pixel)
        .ok_or_else(|| Error::invalid_dimensions(width, 1, "row size overflows usize"))
}

/// Bytes a plane occupies from its first byte: the last row needs no padding.
fn plane_span(stride: usize, ext: PlaneExtent) -> Option<usize> {
    if ext.height == 0 || ext.row_bytes() == 0 {
        return Some(0);
    }
    stride
        .checked_mul(ext.height as usize - 1)?
        .checked_add(ext.row_bytes())
}

fn load_row(src: &[AtomicU8], dst: &mut [u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = s.load(Ordering::Relaxed);
    }
}

fn store_row(dst: &[AtomicU8], src: &[u8]) {
    for (d, &s) in dst.iter().zip(src) {
        d.store(s, Ordering::Relaxed);
    }
}

impl Image {
    /// Allocates a zero-filled image with minimal strides.
    ///
    /// A width or height of 0 yields a valid, empty image.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sv_core::{Image, Orientation, PixelFormat};
    ///
    /// let img = Image::new(4, 4, PixelFormat::GRAY8, Orientation::TopLeft)?;
    /// assert_eq!(img.plane_stride(0), 4);
    /// assert_eq!(img.logical_size(), 16);
    /// assert_eq!(img.allocated_capacity(), 16);
    /// # Ok::<(), sv_core::Error>(())
    /// ```
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let mut strides = [0usize; MAX_PLANES];
        for (plane, stride) in strides.iter_mut().enumerate().take(format.plane_count()) {
            *stride = min_stride(format, plane, width)?;
        }
        Self::allocate(width, height, format, orientation, strides)
    }

    /// Allocates an image whose row strides are padded to a multiple of `align`.
    ///
    /// `align` must be a non-zero power of two.
    pub fn with_row_alignment(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        align: usize,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if !align.is_power_of_two() {
            return Err(Error::InvalidStride {
                plane: 0,
                stride: align,
                min_stride: 1,
            });
        }
        let mut strides = [0usize; MAX_PLANES];
        for (plane, stride) in strides.iter_mut().enumerate().take(format.plane_count()) {
            *stride = min_stride(format, plane, width)?
                .checked_next_multiple_of(align)
                .ok_or_else(|| {
                    Error::invalid_dimensions(width, height, "padded stride overflows")
                })?;
        }
        Self::allocate(width, height, format, orientation, strides)
    }

    fn allocate(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        strides: [usize; MAX_PLANES],
    ) -> Result<Self> {
        let mut planes = [PlaneLayout::default(); MAX_PLANES];
        let mut total = 0usize;
        for plane in 0..format.plane_count() {
            let rows = format.plane_extent(plane, width, height).height as usize;
            planes[plane] = PlaneLayout {
                offset: total,
                stride: strides[plane],
            };
            total = strides[plane]
                .checked_mul(rows)
                .and_then(|size| total.checked_add(size))
                .ok_or_else(|| {
                    Error::invalid_dimensions(width, height, "byte size overflows usize")
                })?;
        }
        let buffer = PixelBuffer::zeroed(total)?;
        Ok(Self {
            width,
            height,
            format,
            orientation,
            planes,
            ownership: Ownership::Owned(Arc::new(buffer)),
        })
    }

    /// Builds an owned image from tightly packed planes.
    ///
    /// `planes` must hold exactly one buffer per active plane, each with the
    /// extent the format prescribes.
    pub fn from_planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        planes: &[PlaneBuf],
    ) -> Result<Self> {
        if planes.len() != format.plane_count() {
            return Err(Error::shape_mismatch(format!(
                "{} has {} planes, got {}",
                format,
                format.plane_count(),
                planes.len()
            )));
        }
        let mut img = Self::new(width, height, format, orientation)?;
        for (index, plane) in planes.iter().enumerate() {
            img.write_plane(index, plane)?;
        }
        Ok(img)
    }

    /// Wraps caller memory without copying.
    ///
    /// One [`ExternalPlane`] is required per active plane. Strides are
    /// checked against the format's minimal stride and every plane must
    /// cover `stride * (rows - 1) + row_bytes` bytes.
    ///
    /// # Safety
    ///
    /// Every plane pointer must be valid for reads and writes of `len`
    /// bytes until this handle and every view derived from it are dropped.
    /// While any of them exist the memory must only be accessed through
    /// them (or through other handles wrapping it).
    pub unsafe fn wrap_external(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: &[ExternalPlane],
        orientation: Orientation,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if planes.len() != format.plane_count() {
            return Err(Error::shape_mismatch(format!(
                "{} has {} planes, got {}",
                format,
                format.plane_count(),
                planes.len()
            )));
        }
        let mut layouts = [PlaneLayout::default(); MAX_PLANES];
        let mut regions = [(std::ptr::null_mut(), 0usize); MAX_PLANES];
        for (index, plane) in planes.iter().enumerate() {
            let ext = format.plane_extent(index, width, height);
            let minimal = min_stride(format, index, width)?;
            let stride = plane.stride.unwrap_or(minimal);
            if stride < minimal {
                return Err(Error::InvalidStride {
                    plane: index,
                    stride,
                    min_stride: minimal,
                });
            }
            let required = plane_span(stride, ext)
                .ok_or_else(|| {
                    Error::invalid_dimensions(width, height, "plane size overflows usize")
                })?;
            if required > 0 && plane.ptr.is_null() {
                return Err(Error::shape_mismatch(format!("plane {index} is null")));
            }
            if plane.len < required {
                return Err(Error::shape_mismatch(format!(
                    "plane {index} needs {required} bytes, got {}",
                    plane.len
                )));
            }
            layouts[index] = PlaneLayout { offset: 0, stride };
            regions[index] = (plane.ptr, plane.len);
        }
        // SAFETY: forwarded to the caller.
        let memory = unsafe { ExternalMemory::new(&regions[..planes.len()]) };
        Ok(Self {
            width,
            height,
            format,
            orientation,
            planes: layouts,
            ownership: Ownership::External(memory),
        })
    }

    /// Wraps a single-plane buffer of any packed format.
    ///
    /// # Safety
    ///
    /// Same contract as [`Image::wrap_external`] for the memory of `data`.
    pub unsafe fn from_plane(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        let mut plane = ExternalPlane::from_slice(data);
        plane.stride = options.stride;
        // SAFETY: forwarded to the caller.
        unsafe { Self::wrap_external(width, height, format, &[plane], options.orientation) }
    }

    /// Wraps an 8-bit grayscale buffer.
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    pub unsafe fn from_gray(
        width: u32,
        height: u32,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_plane(width, height, PixelFormat::GRAY8, data, options) }
    }

    /// Wraps a packed BGR buffer.
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use sv_core::{Image, WrapOptions};
    ///
    /// let mut pixels = vec![7u8; 12];
    /// let img = unsafe { Image::from_bgr(2, 2, &mut pixels, WrapOptions::with_stride(6))? };
    /// assert!(img.is_external());
    /// assert_eq!(img.allocated_capacity(), 0);
    /// drop(img);
    /// assert_eq!(pixels, vec![7u8; 12]);
    /// # Ok::<(), sv_core::Error>(())
    /// ```
    pub unsafe fn from_bgr(
        width: u32,
        height: u32,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_plane(width, height, PixelFormat::BGR, data, options) }
    }

    /// Wraps a packed BGRA buffer.
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    pub unsafe fn from_bgra(
        width: u32,
        height: u32,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_plane(width, height, PixelFormat::BGRA, data, options) }
    }

    /// Wraps a packed RGB buffer.
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    pub unsafe fn from_rgb(
        width: u32,
        height: u32,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_plane(width, height, PixelFormat::RGB, data, options) }
    }

    /// Wraps a packed RGBA buffer.
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    pub unsafe fn from_rgba(
        width: u32,
        height: u32,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::from_plane(width, height, PixelFormat::RGBA, data, options) }
    }

    /// Wraps an NV12/NV21 frame stored as luma rows followed directly by
    /// chroma rows, both at the same stride.
    ///
    /// The default stride is the larger of the two planes' minimal strides
    /// (they differ by one byte for odd widths).
    ///
    /// # Safety
    ///
    /// See [`Image::wrap_external`].
    pub unsafe fn from_semi_planar(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &mut [u8],
        options: WrapOptions,
    ) -> Result<Self> {
        if format.plane_count() != 2 {
            return Err(Error::shape_mismatch(format!("{format} is not semi-planar")));
        }
        let luma_min = min_stride(format, 0, width)?;
        let chroma_min = min_stride(format, 1, width)?;
        let stride = options.stride.unwrap_or(luma_min.max(chroma_min));
        let luma_len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "plane size overflows usize"))?;
        if data.len() < luma_len {
            return Err(Error::shape_mismatch(format!(
                "luma plane needs {luma_len} bytes, got {}",
                data.len()
            )));
        }
        let (luma, chroma) = data.split_at_mut(luma_len);
        let planes = [
            ExternalPlane::from_slice(luma).with_stride(stride),
            ExternalPlane::from_slice(chroma).with_stride(stride),
        ];
        // SAFETY: forwarded to the caller.
        unsafe { Self::wrap_external(width, height, format, &planes, options.orientation) }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns `true` if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Full image rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Pixel format descriptor.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Stored orientation.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Relabels the stored orientation without moving any pixels.
    #[inline]
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Number of active planes.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.format.plane_count()
    }

    /// Extent of `plane`; zero for inactive planes.
    #[inline]
    pub fn plane_extent(&self, plane: usize) -> PlaneExtent {
        self.format.plane_extent(plane, self.width, self.height)
    }

    /// Row stride of `plane` in bytes; zero for inactive planes.
    #[inline]
    pub fn plane_stride(&self, plane: usize) -> usize {
        self.planes.get(plane).map_or(0, |p| p.stride)
    }

    /// Row stride of plane 0.
    #[inline]
    pub fn stride(&self) -> usize {
        self.planes[0].stride
    }

    /// Sum of tightly packed plane sizes; ignores stride padding.
    pub fn logical_size(&self) -> usize {
        (0..self.plane_count())
            .map(|plane| self.plane_extent(plane).size())
            .sum()
    }

    /// Byte length of the owned allocation; 0 for external images.
    ///
    /// A view reports the capacity of the allocation it shares.
    pub fn allocated_capacity(&self) -> usize {
        match &self.ownership {
            Ownership::Owned(buf) => buf.len(),
            Ownership::External(_) => 0,
        }
    }

    /// Number of handles sharing the allocation; `None` for external images.
    pub fn ref_count(&self) -> Option<usize> {
        match &self.ownership {
            Ownership::Owned(buf) => Some(Arc::strong_count(buf)),
            Ownership::External(_) => None,
        }
    }

    /// Returns `true` if the image owns (a share of) its storage.
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Owned(_))
    }

    /// Returns `true` if the image wraps caller memory.
    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.ownership, Ownership::External(_))
    }

    /// Ownership tag of the storage.
    #[inline]
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Returns `true` if writes through one handle can be seen through the other.
    pub fn shares_storage_with(&self, other: &Image) -> bool {
        self.ownership.aliases(&other.ownership)
    }

    fn check_plane(&self, plane: usize) -> Result<PlaneExtent> {
        if plane >= self.plane_count() {
            return Err(Error::InvalidPlane {
                plane,
                format: self.format.name(),
            });
        }
        Ok(self.plane_extent(plane))
    }

    fn row(&self, plane: usize, y: u32, ext: PlaneExtent) -> &[AtomicU8] {
        let layout = self.planes[plane];
        let start = layout.offset + y as usize * layout.stride;
        &self.ownership.region(plane)[start..start + ext.row_bytes()]
    }

    /// Bytes of `plane` from its first sample through the end of its last
    /// row, stride padding included.
    pub fn plane_data(&self, plane: usize) -> Result<&[AtomicU8]> {
        let ext = self.check_plane(plane)?;
        let layout = self.planes[plane];
        let span = plane_span(layout.stride, ext).unwrap_or(0);
        // Empty views may sit one past the last row or column.
        if span == 0 {
            return Ok(&[]);
        }
        Ok(&self.ownership.region(plane)[layout.offset..layout.offset + span])
    }

    /// Luma bytes of a YUV image; the same bytes as `plane_data(0)`.
    pub fn luma(&self) -> Result<&[AtomicU8]> {
        self.plane_data(0)
    }

    /// Copies row `y` of `plane` into the start of `dst`.
    pub fn read_row(&self, plane: usize, y: u32, dst: &mut [u8]) -> Result<()> {
        let ext = self.check_plane(plane)?;
        if y >= ext.height {
            return Err(Error::out_of_bounds(0, y, ext.width, 1, ext.width, ext.height));
        }
        if dst.len() < ext.row_bytes() {
            return Err(Error::shape_mismatch(format!(
                "row needs {} bytes, buffer has {}",
                ext.row_bytes(),
                dst.len()
            )));
        }
        load_row(self.row(plane, y, ext), &mut dst[..ext.row_bytes()]);
        Ok(())
    }

    /// Overwrites row `y` of `plane` from the start of `src`.
    pub fn write_row(&mut self, plane: usize, y: u32, src: &[u8]) -> Result<()> {
        let ext = self.check_plane(plane)?;
        if y >= ext.height {
            return Err(Error::out_of_bounds(0, y, ext.width, 1, ext.width, ext.height));
        }
        if src.len() < ext.row_bytes() {
            return Err(Error::shape_mismatch(format!(
                "row needs {} bytes, buffer has {}",
                ext.row_bytes(),
                src.len()
            )));
        }
        store_row(self.row(plane, y, ext), &src[..ext.row_bytes()]);
        Ok(())
    }

    /// Copies `plane` into a tightly packed buffer.
    pub fn read_plane(&self, plane: usize) -> Result<PlaneBuf> {
        let ext = self.check_plane(plane)?;
        let mut out = PlaneBuf::new(ext)?;
        for y in 0..ext.height {
            load_row(self.row(plane, y, ext), out.row_mut(y));
        }
        Ok(out)
    }

    /// Overwrites `plane` from a buffer of exactly the plane's extent.
    pub fn write_plane(&mut self, plane: usize, src: &PlaneBuf) -> Result<()> {
        let ext = self.check_plane(plane)?;
        if src.extent() != ext {
            return Err(Error::shape_mismatch(format!(
                "plane {plane} is {}x{}x{}, buffer is {}x{}x{}",
                ext.width,
                ext.height,
                ext.bytes_per_pixel,
                src.width(),
                src.height(),
                src.bytes_per_pixel()
            )));
        }
        for y in 0..ext.height {
            store_row(self.row(plane, y, ext), src.row(y));
        }
        Ok(())
    }

    fn sample_range(&self, plane: usize, x: u32, y: u32) -> Result<(PlaneExtent, usize)> {
        let ext = self.check_plane(plane)?;
        if x >= ext.width || y >= ext.height {
            return Err(Error::out_of_bounds(x, y, 1, 1, ext.width, ext.height));
        }
        Ok((ext, x as usize * ext.bytes_per_pixel))
    }

    /// Reads the sample of `plane` at plane coordinates `(x, y)`.
    pub fn sample(&self, plane: usize, x: u32, y: u32) -> Result<Sample> {
        let (ext, start) = self.sample_range(plane, x, y)?;
        let row = self.row(plane, y, ext);
        Ok(row[start..start + ext.bytes_per_pixel]
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect())
    }

    /// Writes the sample of `plane` at plane coordinates `(x, y)`.
    ///
    /// `value` must be exactly one sample long.
    pub fn set_sample(&mut self, plane: usize, x: u32, y: u32, value: &[u8]) -> Result<()> {
        let (ext, start) = self.sample_range(plane, x, y)?;
        if value.len() != ext.bytes_per_pixel {
            return Err(Error::shape_mismatch(format!(
                "sample is {} bytes, got {}",
                ext.bytes_per_pixel,
                value.len()
            )));
        }
        let row = self.row(plane, y, ext);
        store_row(&row[start..start + ext.bytes_per_pixel], value);
        Ok(())
    }

    /// Sets every sample of `plane` to `value`.
    pub fn fill_plane(&mut self, plane: usize, value: &[u8]) -> Result<()> {
        let ext = self.check_plane(plane)?;
        if value.len() != ext.bytes_per_pixel {
            return Err(Error::shape_mismatch(format!(
                "sample is {} bytes, got {}",
                ext.bytes_per_pixel,
                value.len()
            )));
        }
        for y in 0..ext.height {
            for px in self.row(plane, y, ext).chunks_exact(ext.bytes_per_pixel.max(1)) {
                store_row(px, value);
            }
        }
        Ok(())
    }

    /// Returns a view of `rect` sharing this image's storage.
    ///
    /// Plane offsets advance by the rectangle origin, divided by each
    /// plane's subsampling factor (rounded down). Strides are unchanged.
    pub fn view(&self, rect: Rect) -> Result<Image> {
        if !rect.fits_within(self.width, self.height) {
            return Err(Error::out_of_bounds(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                self.width,
                self.height,
            ));
        }
        let mut planes = self.planes;
        for (plane, layout) in planes.iter_mut().enumerate().take(self.plane_count()) {
            let (sx, sy) = self.format.subsampling(plane);
            let bpp = self.plane_extent(plane).bytes_per_pixel;
            layout.offset += (rect.y / sy) as usize * layout.stride + (rect.x / sx) as usize * bpp;
        }
        Ok(Self {
            width: rect.width,
            height: rect.height,
            format: self.format,
            orientation: self.orientation,
            planes,
            ownership: self.ownership.clone(),
        })
    }

    /// Copies the pixels into a new owned image with minimal strides.
    pub fn deep_clone(&self) -> Result<Image> {
        let dst = Self::new(self.width, self.height, self.format, self.orientation)?;
        for plane in 0..self.plane_count() {
            let ext = self.plane_extent(plane);
            for y in 0..ext.height {
                let src = self.row(plane, y, ext);
                for (d, s) in dst.row(plane, y, ext).iter().zip(src) {
                    d.store(s.load(Ordering::Relaxed), Ordering::Relaxed);
                }
            }
        }
        Ok(dst)
    }

    /// Copies this image's pixels into the top-left corner of `dst`.
    ///
    /// Formats must match and every `dst` plane must be at least as large
    /// as the corresponding source plane. `dst` keeps its size and
    /// orientation. Overlapping storage is handled by staging the source.
    pub fn copy_into(&self, dst: &mut Image) -> Result<()> {
        if self.format != dst.format {
            return Err(Error::shape_mismatch(format!(
                "cannot copy {} into {}",
                self.format, dst.format
            )));
        }
        for plane in 0..self.plane_count() {
            let src_ext = self.plane_extent(plane);
            let dst_ext = dst.plane_extent(plane);
            if src_ext.width > dst_ext.width || src_ext.height > dst_ext.height {
                return Err(Error::shape_mismatch(format!(
                    "plane {plane}: {}x{} does not fit in {}x{}",
                    src_ext.width, src_ext.height, dst_ext.width, dst_ext.height
                )));
            }
        }
        let staged = if self.shares_storage_with(dst) {
            Some(
                (0..self.plane_count())
                    .map(|plane| self.read_plane(plane))
                    .collect::<Result<Vec<_>>>()?,
            )
        } else {
            None
        };
        for plane in 0..self.plane_count() {
            let ext = self.plane_extent(plane);
            for y in 0..ext.height {
                let out = dst.row(plane, y, ext);
                match &staged {
                    Some(planes) => store_row(out, planes[plane].row(y)),
                    None => {
                        for (d, s) in out.iter().zip(self.row(plane, y, ext)) {
                            d.store(s.load(Ordering::Relaxed), Ordering::Relaxed);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Exchanges the complete state of two handles without touching pixels.
    #[inline]
    pub fn swap(&mut self, other: &mut Image) {
        std::mem::swap(self, other);
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strides: Vec<usize> = (0..self.plane_count()).map(|p| self.plane_stride(p)).collect();
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("orientation", &self.orientation)
            .field("strides", &strides)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} {} strides=[",
            self.format, self.width, self.height, self.orientation
        )?;
        for plane in 0..self.plane_count() {
            if plane > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.plane_stride(plane))?;
        }
        f.write_str("] ")?;
        match self.ref_count() {
            Some(refs) => write!(f, "owned(refs={refs})"),
            None => f.write_str("external"),
        }
    }
}
