use core::ops::Index;
use core::ptr::{self, NonNull};

use super::{Header, OpaqueTerm};

/// A tuple: an arityval header followed by that many term words
#[repr(C)]
pub struct Tuple {
    header: Header,
    elements: [OpaqueTerm],
}
impl Tuple {
    /// Builds the fat pointer to the tuple whose header is at `ptr`
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live arityval header followed by its elements.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let arity = (*ptr).arityval();
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr, arity) as *mut Self)
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn elements(&self) -> &[OpaqueTerm] {
        &self.elements
    }

    #[inline]
    pub fn elements_mut(&mut self) -> &mut [OpaqueTerm] {
        &mut self.elements
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<OpaqueTerm> {
        self.elements.get(index).copied()
    }
}
impl Index<usize> for Tuple {
    type Output = OpaqueTerm;

    fn index(&self, index: usize) -> &Self::Output {
        &self.elements[index]
    }
}
