use core::ptr::{self, NonNull};

use super::{OpaqueTerm, Tuple};

/// Arity of a flat map thing, which only covers the size word
pub const FLAT_MAP_ARITY: usize = 1;

/// A flat map: a header, the number of entries, a boxed tuple holding the
/// keys, then one value per key.
///
/// Entries stay in the order they were built in, and lookups are a linear
/// scan comparing key words. Builders must be given distinct keys.
///
/// Only the size word is counted by the header arity; the keys pointer and
/// the values are ordinary term words.
#[repr(C)]
pub struct FlatMap {
    header: OpaqueTerm,
    size: usize,
    keys: OpaqueTerm,
    values: [OpaqueTerm],
}
impl FlatMap {
    /// # Safety
    ///
    /// `ptr` must point to a live map header followed by its entries.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let size = (*ptr.add(1)).raw();
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr, size) as *mut Self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The boxed keys tuple
    #[inline]
    pub fn keys_term(&self) -> OpaqueTerm {
        self.keys
    }

    /// # Safety
    ///
    /// The keys tuple must be live.
    pub unsafe fn keys(&self) -> &[OpaqueTerm] {
        Tuple::from_header(self.keys.boxed_val()).as_ref().elements()
    }

    #[inline]
    pub fn values(&self) -> &[OpaqueTerm] {
        &self.values
    }

    /// Looks up the value stored under `key`, comparing words for identity
    ///
    /// # Safety
    ///
    /// The keys tuple must be live.
    pub unsafe fn get(&self, key: OpaqueTerm) -> Option<OpaqueTerm> {
        let index = self.keys().iter().position(|k| *k == key)?;
        self.values.get(index).copied()
    }
}
