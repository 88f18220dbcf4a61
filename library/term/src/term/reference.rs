//! Internal reference layouts.
//!
//! Ordinary references carry `REF_NUMBERS` 32-bit numbers. Magic references
//! instead point to an off-heap `MagicBinary` and are linked into their
//! owner's off-heap list. Both share the `Ref` subtag.
//!
//! On 64-bit targets the two layouts have the same size and header arity, so
//! the ordinary layout reserves one 32-bit slot for `ORDINARY_REF_MARKER`.
//! That slot overlaps the low half of the magic layout's `binary` pointer,
//! which an aligned pointer can never fill with all ones. On 32-bit targets
//! the layouts differ in size and the header arity tells them apart.
use core::fmt;
use core::mem;
use core::ptr::NonNull;

use static_assertions::{assert_eq_size, const_assert};

use crate::arch::{self, REF_NUMBERS, WORD_SIZE};
use crate::offheap::{MagicBinary, OffHeapHeader};

use super::{Header, OpaqueTerm, Subtag};

/// The value stored in the marker slot of every ordinary reference
pub const ORDINARY_REF_MARKER: u32 = u32::MAX;

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        const SLOTS: usize = REF_NUMBERS + 1;

        /// The index of the 32-bit slot overlapping the low half of
        /// `MagicRef::binary`
        pub const MARKER_SLOT: usize = if cfg!(target_endian = "big") { 1 } else { 0 };
        const MARKER: Option<usize> = Some(MARKER_SLOT);

        assert_eq_size!(OrdinaryRef, MagicRef);
        assert_eq_size!(OrdinaryRef, [usize; 1 + arch::ORDINARY_REF_ARITY]);
    } else {
        const SLOTS: usize = REF_NUMBERS;
        const MARKER: Option<usize> = None;

        const_assert!(mem::size_of::<OrdinaryRef>() != mem::size_of::<MagicRef>());
        assert_eq_size!(OrdinaryRef, [usize; 1 + arch::ORDINARY_REF_ARITY]);
    }
}

assert_eq_size!(MagicRef, [usize; 1 + arch::MAGIC_REF_ARITY]);
const_assert!(arch::REF_MARKER_DISCIPLINE == (arch::ORDINARY_REF_ARITY == arch::MAGIC_REF_ARITY));

/// A reference made of plain numbers
#[derive(Copy, Clone)]
#[repr(C)]
pub struct OrdinaryRef {
    header: OpaqueTerm,
    slots: [u32; SLOTS],
}
impl OrdinaryRef {
    pub fn new(numbers: [u32; REF_NUMBERS]) -> Self {
        let mut slots = [0; SLOTS];
        let mut numbers = numbers.into_iter();
        for (index, slot) in slots.iter_mut().enumerate() {
            *slot = if Self::is_marker_slot(index) {
                ORDINARY_REF_MARKER
            } else {
                numbers.next().unwrap_or_default()
            };
        }
        Self {
            header: Header::new(Subtag::Ref, arch::ORDINARY_REF_ARITY).into(),
            slots,
        }
    }

    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    #[inline(always)]
    fn is_marker_slot(index: usize) -> bool {
        MARKER == Some(index)
    }

    /// The marker slot, on targets which distinguish refs by marker
    #[cfg(target_pointer_width = "64")]
    #[inline]
    pub fn marker(&self) -> u32 {
        self.slots[MARKER_SLOT]
    }

    pub fn numbers(&self) -> [u32; REF_NUMBERS] {
        let mut numbers = [0; REF_NUMBERS];
        let values = self
            .slots
            .iter()
            .enumerate()
            .filter(|(index, _)| !Self::is_marker_slot(*index))
            .map(|(_, n)| *n);
        for (number, value) in numbers.iter_mut().zip(values) {
            *number = value;
        }
        numbers
    }
}
impl fmt::Debug for OrdinaryRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("OrdinaryRef").field(&self.numbers()).finish()
    }
}

/// A reference backed by an off-heap magic binary
#[derive(Copy, Clone)]
#[repr(C)]
pub struct MagicRef {
    header: OpaqueTerm,
    binary: *const MagicBinary,
    next: *mut OffHeapHeader,
}
impl MagicRef {
    pub(crate) fn new(binary: *const MagicBinary, next: *mut OffHeapHeader) -> Self {
        Self {
            header: Header::new(Subtag::Ref, arch::MAGIC_REF_ARITY).into(),
            binary,
            next,
        }
    }

    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    #[inline]
    pub fn binary_ptr(&self) -> *const MagicBinary {
        self.binary
    }

    #[inline]
    pub fn binary(&self) -> &MagicBinary {
        // A live magic ref holds a count on its binary
        unsafe { &*self.binary }
    }
}
impl fmt::Debug for MagicRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("MagicRef").field(&self.binary).finish()
    }
}

/// Either layout of an internal reference, as found behind a `Ref` header
#[derive(Copy, Clone)]
#[repr(C)]
pub union RefThing {
    pub ordinary: OrdinaryRef,
    pub magic: MagicRef,
}
impl RefThing {
    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    /// Returns true if this reference is backed by a magic binary
    #[cfg(target_pointer_width = "64")]
    #[inline]
    pub fn is_magic(&self) -> bool {
        // Both layouts are fully initialized words, so the marker slot can
        // always be read
        unsafe { self.ordinary.marker() != ORDINARY_REF_MARKER }
    }

    /// Returns true if this reference is backed by a magic binary
    #[cfg(not(target_pointer_width = "64"))]
    #[inline]
    pub fn is_magic(&self) -> bool {
        self.header().thing_arityval() == arch::MAGIC_REF_ARITY
    }

    #[inline]
    pub fn header(&self) -> OpaqueTerm {
        unsafe { self.magic.header }
    }
}

/// The byte offset of the marker slot within an ordinary reference, if the
/// target has one
pub const fn marker_offset() -> Option<usize> {
    match MARKER {
        Some(slot) => Some(WORD_SIZE + slot * mem::size_of::<u32>()),
        None => None,
    }
}

/// Builds the magic layout around arbitrary pointer patterns, for probing
/// what an ordinary reference would read out of it
#[cfg_attr(not(target_pointer_width = "64"), allow(dead_code))]
pub(crate) fn probe_magic_layout(pointer: usize) -> RefThing {
    RefThing {
        magic: MagicRef::new(pointer as *const MagicBinary, pointer as *mut OffHeapHeader),
    }
}
