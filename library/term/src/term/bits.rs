//! Bit-string layouts.
//!
//! Small bit strings are stored on the heap (`HeapBits`), larger ones live
//! off-heap and are referenced through a `BinRef`. A `SubBits` is a view of
//! a range of bits in either of those, and keeps the viewed term alive
//! through its trailing `orig` field, the only term word in its layout.
use core::ptr::{self, NonNull};
use core::slice;

use bitflags::bitflags;

use crate::offheap::{OffHeapBinary, OffHeapHeader};

use super::OpaqueTerm;

bitflags! {
    /// Flags carried by a bit-string view
    pub struct BitsFlags: usize {
        /// The view covers the whole tail of a buffer that may still grow
        const WRITABLE = 0b01;
    }
}

/// Arity of a sub-bits thing: `flags`, `start`, `end` and `orig`
pub const SUB_BITS_ARITY: usize = 4;

/// Arity of a bin-ref thing: `val` and `next`
pub const BIN_REF_ARITY: usize = 2;

/// A bit string stored inline: a header, the size in bits, then the data
/// padded out to whole words
#[repr(C)]
pub struct HeapBits {
    header: OpaqueTerm,
    bit_size: usize,
    data: [u8],
}
impl HeapBits {
    /// # Safety
    ///
    /// `ptr` must point to a live heap-bits header followed by its payload.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let data_words = (*ptr).thing_arityval() - 1;
        let len = data_words * crate::arch::WORD_SIZE;
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr as *mut u8, len) as *mut Self)
    }

    #[inline]
    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    /// The bytes holding the bits, the last one possibly partial
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        let len = (self.bit_size + 7) / 8;
        &self.data[..len]
    }
}

/// A reference to an off-heap binary, linked into its owner's off-heap list
#[derive(Copy, Clone)]
#[repr(C)]
pub struct BinRef {
    header: OpaqueTerm,
    val: *const OffHeapBinary,
    next: *mut OffHeapHeader,
}
impl BinRef {
    /// # Safety
    ///
    /// `ptr` must point to a live bin-ref header.
    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    pub(crate) fn new(header: OpaqueTerm, val: *const OffHeapBinary) -> Self {
        Self {
            header,
            val,
            next: ptr::null_mut(),
        }
    }

    #[inline]
    pub fn binary(&self) -> &OffHeapBinary {
        // The bin-ref holds a count on its binary for as long as it is live
        unsafe { &*self.val }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.binary().as_bytes()
    }
}

/// A view of the bits `start..end` of the bit string `orig`
#[derive(Copy, Clone)]
#[repr(C)]
pub struct SubBits {
    header: OpaqueTerm,
    flags: usize,
    start: usize,
    end: usize,
    orig: OpaqueTerm,
}
impl SubBits {
    pub(crate) fn new(
        header: OpaqueTerm,
        flags: BitsFlags,
        start: usize,
        end: usize,
        orig: OpaqueTerm,
    ) -> Self {
        Self {
            header,
            flags: flags.bits(),
            start,
            end,
            orig,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to a live sub-bits header.
    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    #[inline]
    pub fn flags(&self) -> BitsFlags {
        BitsFlags::from_bits_truncate(self.flags)
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn bit_size(&self) -> usize {
        self.end - self.start
    }

    /// The boxed term whose bits this view covers
    #[inline]
    pub fn orig(&self) -> OpaqueTerm {
        self.orig
    }

    /// Returns the bytes of the underlying bit string which contain the
    /// viewed bits.
    ///
    /// # Safety
    ///
    /// `orig` must be live.
    pub unsafe fn underlying_bytes(&self) -> &[u8] {
        let header = self.orig.boxed_val();
        let bytes = if (*header).is_heap_bits_header() {
            HeapBits::from_header(header).as_ref().as_bytes()
        } else {
            BinRef::from_header(header).as_ref().as_bytes()
        };
        let first = self.start / 8;
        let last = (self.end + 7) / 8;
        slice::from_raw_parts(bytes.as_ptr().add(first), last - first)
    }
}
