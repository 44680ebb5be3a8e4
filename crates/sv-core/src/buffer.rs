//! Pixel storage and the ownership model.
//!
//! An image either owns a reference-counted [`PixelBuffer`] or borrows
//! caller memory through [`ExternalMemory`]. The two cases are modelled by
//! [`Ownership`] so the "no reference count" case is a checked variant
//! rather than a null sentinel.
//!
//! Storage is exposed as `[AtomicU8]`. Views alias their source, so several
//! handles may read and write the same bytes, possibly from different
//! threads. Relaxed atomic bytes make that aliasing free of data races
//! without any further locking.

use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use crate::format::MAX_PLANES;
use crate::{Error, Result};

/// Empty vector with room for exactly `len` elements.
///
/// Exhaustion is reported as [`Error::AllocationFailed`] instead of
/// aborting the process. Every scratch allocation sized by image
/// dimensions goes through here.
pub fn try_vec<T>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        Error::allocation_failed(len.saturating_mul(size_of::<T>()), e.to_string())
    })?;
    Ok(v)
}

/// Heap allocation backing owned images.
///
/// Shared between an image and its views through an [`Arc`]; the
/// allocation is freed when the last handle is dropped.
pub struct PixelBuffer {
    bytes: Box<[AtomicU8]>,
}

impl PixelBuffer {
    /// Allocates `len` zeroed bytes, reporting exhaustion instead of aborting.
    pub fn zeroed(len: usize) -> Result<Self> {
        let mut bytes = try_vec(len)?;
        bytes.resize_with(len, || AtomicU8::new(0));
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Size of the allocation in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-byte allocation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole allocation.
    #[inline]
    pub fn as_bytes(&self) -> &[AtomicU8] {
        &self.bytes
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer").field("len", &self.len()).finish()
    }
}

/// One caller-owned memory region.
#[derive(Debug, Clone, Copy)]
struct RawRegion {
    ptr: NonNull<AtomicU8>,
    len: usize,
}

impl RawRegion {
    fn contains_overlap(&self, other: &RawRegion) -> bool {
        if self.len == 0 || other.len == 0 {
            return false;
        }
        let a = self.ptr.as_ptr() as usize;
        let b = other.ptr.as_ptr() as usize;
        a < b + other.len && b < a + self.len
    }
}

/// Caller-supplied plane memory. Never freed by this crate.
#[derive(Debug, Clone)]
pub struct ExternalMemory {
    regions: [Option<RawRegion>; MAX_PLANES],
}

// SAFETY: the regions are only ever accessed as `AtomicU8`, and the caller of
// `Image::wrap_external` guarantees the memory stays valid for as long as any
// handle referencing it exists.
unsafe impl Send for ExternalMemory {}
unsafe impl Sync for ExternalMemory {}

impl ExternalMemory {
    /// Records plane regions.
    ///
    /// # Safety
    ///
    /// Every non-null `ptr` must be valid for reads and writes of `len`
    /// bytes for the lifetime of the returned value and all its clones, and
    /// must not be accessed non-atomically while any of them exist.
    pub(crate) unsafe fn new(planes: &[(*mut u8, usize)]) -> Self {
        let mut regions = [None; MAX_PLANES];
        for (slot, &(ptr, len)) in regions.iter_mut().zip(planes) {
            let ptr = match NonNull::new(ptr) {
                Some(ptr) if len > 0 => ptr.cast::<AtomicU8>(),
                _ => NonNull::dangling(),
            };
            let len = if ptr == NonNull::dangling() { 0 } else { len };
            *slot = Some(RawRegion { ptr, len });
        }
        Self { regions }
    }

    fn region(&self, plane: usize) -> &[AtomicU8] {
        match self.regions.get(plane).copied().flatten() {
            // SAFETY: upheld by the contract of `ExternalMemory::new`;
            // `AtomicU8` has the size and alignment of `u8`.
            Some(r) => unsafe { std::slice::from_raw_parts(r.ptr.as_ptr(), r.len) },
            None => &[],
        }
    }

    fn overlaps(&self, other: &ExternalMemory) -> bool {
        self.regions.iter().flatten().any(|a| {
            other
                .regions
                .iter()
                .flatten()
                .any(|b| a.contains_overlap(b))
        })
    }
}

/// Who is responsible for an image's pixel memory.
#[derive(Debug, Clone)]
pub enum Ownership {
    /// Shared, reference-counted allocation. Plane offsets index into it.
    Owned(Arc<PixelBuffer>),
    /// Caller memory; plane offsets index into each plane's own region.
    External(ExternalMemory),
}

impl Ownership {
    /// Bytes addressable by `plane`, starting at the plane's region base.
    pub(crate) fn region(&self, plane: usize) -> &[AtomicU8] {
        match self {
            Self::Owned(buf) => buf.as_bytes(),
            Self::External(mem) => mem.region(plane),
        }
    }

    /// Returns `true` if both handles can observe each other's writes.
    pub(crate) fn aliases(&self, other: &Ownership) -> bool {
        match (self, other) {
            (Self::Owned(a), Self::Owned(b)) => Arc::ptr_eq(a, b),
            (Self::External(a), Self::External(b)) => a.overlaps(b),
            _ => false,
        }
    }
}
