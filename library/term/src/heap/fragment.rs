use core::ops::Range;
use core::ptr::NonNull;
use core::slice;
use std::alloc::{self, Layout};

use crate::arch::{MIN_ALIGN, WORD_SIZE};
use crate::error::HeapError;
use crate::offheap::OffHeap;
use crate::term::OpaqueTerm;

use super::TermAlloc;

/// The memory region backing a heap fragment and the layout it was
/// allocated with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawFragment {
    layout: Layout,
    base: NonNull<OpaqueTerm>,
}
impl RawFragment {
    fn allocate(words: usize) -> Result<Self, HeapError> {
        let size = words
            .checked_mul(WORD_SIZE)
            .ok_or(HeapError::InvalidSize(words))?;
        let layout =
            Layout::from_size_align(size, MIN_ALIGN).map_err(|_| HeapError::InvalidSize(words))?;
        let base = if size == 0 {
            NonNull::dangling()
        } else {
            // Zeroed memory reads as empty tuple headers, never as pointers
            let ptr = unsafe { alloc::alloc_zeroed(layout) };
            NonNull::new(ptr as *mut OpaqueTerm).ok_or(HeapError::OutOfMemory(words))?
        };
        Ok(Self { layout, base })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.layout.size() / WORD_SIZE
    }

    #[inline]
    fn as_ptr_range(&self) -> Range<*const u8> {
        let base = self.base.as_ptr() as *const u8;
        base..base.wrapping_add(self.layout.size())
    }
}

/// A fixed-size region of term words, filled bottom-up.
///
/// Every thing built into the fragment that holds a count on an off-heap
/// object is linked into the fragment's own off-heap list, and those counts
/// are given back when the fragment is dropped.
pub struct HeapFragment {
    raw: RawFragment,
    /// Number of words handed out so far
    top: usize,
    off_heap: OffHeap,
}
impl HeapFragment {
    /// Allocates a fragment able to hold `words` term words
    pub fn new(words: usize) -> Result<Self, HeapError> {
        Ok(Self {
            raw: RawFragment::allocate(words)?,
            top: 0,
            off_heap: OffHeap::new(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    #[inline]
    pub fn used_words(&self) -> usize {
        self.top
    }

    #[inline]
    pub fn available_words(&self) -> usize {
        self.capacity() - self.top
    }

    /// Returns true if `ptr` points into the used part of this fragment
    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        let range = self.raw.as_ptr_range();
        let used_end = range.start.wrapping_add(self.top * WORD_SIZE);
        let ptr = ptr as *const u8;
        range.start <= ptr && ptr < used_end
    }

    /// The words allocated so far
    pub fn used(&self) -> &[OpaqueTerm] {
        unsafe { slice::from_raw_parts(self.raw.base.as_ptr(), self.top) }
    }

    pub(crate) fn used_mut(&mut self) -> &mut [OpaqueTerm] {
        unsafe { slice::from_raw_parts_mut(self.raw.base.as_ptr(), self.top) }
    }

    #[inline]
    pub fn off_heap(&self) -> &OffHeap {
        &self.off_heap
    }
}
impl TermAlloc for HeapFragment {
    fn alloc_words(&mut self, words: usize) -> Result<NonNull<OpaqueTerm>, HeapError> {
        let available = self.available_words();
        if words > available {
            return Err(HeapError::Exhausted {
                requested: words,
                available,
            });
        }
        let ptr = unsafe { self.raw.base.as_ptr().add(self.top) };
        self.top += words;
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    #[inline]
    fn off_heap_mut(&mut self) -> &mut OffHeap {
        &mut self.off_heap
    }
}
impl Drop for HeapFragment {
    fn drop(&mut self) {
        // Every linked thing lives in this fragment, which is still allocated
        unsafe {
            self.off_heap.release();
        }
        if self.raw.layout.size() > 0 {
            unsafe {
                alloc::dealloc(self.raw.base.as_ptr() as *mut u8, self.raw.layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bump_allocation_and_exhaustion() {
        let mut heap = HeapFragment::new(4).unwrap();
        assert_eq!(heap.capacity(), 4);
        let first = heap.alloc_words(3).unwrap();
        assert_eq!(first.as_ptr() as usize % MIN_ALIGN, 0);
        assert!(heap.contains(first.as_ptr()));
        assert_eq!(heap.used_words(), 3);
        assert_eq!(
            heap.alloc_words(2),
            Err(HeapError::Exhausted {
                requested: 2,
                available: 1
            })
        );
        let last = heap.alloc_words(1).unwrap();
        assert!(heap.contains(last.as_ptr()));
        assert_eq!(heap.available_words(), 0);
    }

    #[test]
    fn empty_fragment() {
        let mut heap = HeapFragment::new(0).unwrap();
        assert!(heap.used().is_empty());
        assert!(heap.alloc_words(1).is_err());
    }

    #[test]
    fn contains_only_used_words() {
        let mut heap = HeapFragment::new(8).unwrap();
        let ptr = heap.alloc_words(1).unwrap();
        let beyond = unsafe { ptr.as_ptr().add(1) };
        assert!(heap.contains(ptr.as_ptr()));
        assert!(!heap.contains(beyond));
        let other = 0usize;
        assert!(!heap.contains(&other));
    }
}
