use core::ptr::NonNull;

use log::{debug, warn};

use crate::error::HeapError;
use crate::offheap::OffHeap;
use crate::term::{self, OpaqueTerm};

use super::{HeapFragment, TermAlloc};

/// A heap fragment holding constant terms, such as those of a loaded module.
///
/// Terms are built into the area like any other heap. Sealing it marks
/// every pointer into the area as a literal and freezes it: from then on
/// nothing can be allocated in it, and its terms may be shared freely.
pub struct LiteralArea {
    fragment: HeapFragment,
    sealed: bool,
}
impl LiteralArea {
    pub fn new(words: usize) -> Result<Self, HeapError> {
        Ok(Self {
            fragment: HeapFragment::new(words)?,
            sealed: false,
        })
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns true if `ptr` points into the terms of this area
    #[inline]
    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        self.fragment.contains(ptr)
    }

    #[inline]
    pub fn used(&self) -> &[OpaqueTerm] {
        self.fragment.used()
    }

    /// Tags every pointer in the area, and `root`, as literal and freezes the
    /// area. Sealing an already sealed area only tags `root`.
    ///
    /// Pointers already tagged literal may lead anywhere. Any other pointer,
    /// in the area or in `root`, must lead into the area: otherwise the
    /// area is left as it was and `HeapError::ForeignPointer` is returned.
    pub fn seal(&mut self, root: &mut OpaqueTerm) -> Result<(), HeapError> {
        let bounds = self.fragment.used().as_ptr_range();
        let escapes = |word: OpaqueTerm| !word.is_literal() && !bounds.contains(&pointee(word));

        if (root.is_boxed() || root.is_list()) && escapes(*root) {
            return Err(HeapError::ForeignPointer(root.raw()));
        }

        if self.sealed {
            term::tag_literals(root, &mut []);
            return Ok(());
        }

        let mut foreign = None;
        term::for_each_pointer_slot(self.fragment.used_mut(), |_, word| {
            if foreign.is_none() && escapes(*word) {
                foreign = Some(word.raw());
            }
        });
        if let Some(word) = foreign {
            warn!(target: "term", "refusing to seal literal area holding {:#x}", word);
            return Err(HeapError::ForeignPointer(word));
        }

        term::tag_literals(root, self.fragment.used_mut());
        debug!(target: "term", "sealed literal area of {} words", self.fragment.used_words());
        self.sealed = true;
        Ok(())
    }
}

/// The address a boxed or list word points to
fn pointee(word: OpaqueTerm) -> *const OpaqueTerm {
    if word.is_list() {
        word.list_val() as *const OpaqueTerm
    } else {
        word.boxed_val()
    }
}
impl TermAlloc for LiteralArea {
    fn alloc_words(&mut self, words: usize) -> Result<NonNull<OpaqueTerm>, HeapError> {
        if self.sealed {
            return Err(HeapError::Sealed);
        }
        self.fragment.alloc_words(words)
    }

    #[inline]
    fn off_heap_mut(&mut self) -> &mut OffHeap {
        self.fragment.off_heap_mut()
    }
}
