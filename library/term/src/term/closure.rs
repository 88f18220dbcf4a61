use core::ptr::{self, NonNull};

use super::OpaqueTerm;

/// Arity of a fun thing: the function index and the packed arity/free count
pub const CLOSURE_ARITY: usize = 2;

const FREE_SHIFT: u32 = 8;
const ARITY_MASK: usize = (1 << FREE_SHIFT) - 1;

/// The largest arity a closure can take
pub const MAX_CLOSURE_ARITY: usize = ARITY_MASK;

/// A closure: a fun header, the index of the function it calls, its arity and
/// number of captured values, then the captured values themselves.
///
/// The header arity only covers the two scalar words, so the captured
/// environment is scanned as ordinary term words.
#[repr(C)]
pub struct Closure {
    header: OpaqueTerm,
    index: usize,
    info: usize,
    env: [OpaqueTerm],
}
impl Closure {
    #[inline]
    pub(crate) const fn pack_info(arity: usize, num_free: usize) -> usize {
        (num_free << FREE_SHIFT) | (arity & ARITY_MASK)
    }

    /// # Safety
    ///
    /// `ptr` must point to a live fun header followed by its environment.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let num_free = (*ptr.add(2)).raw() >> FREE_SHIFT;
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr, num_free) as *mut Self)
    }

    /// The index of the function this closure calls
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.info & ARITY_MASK
    }

    #[inline]
    pub fn env(&self) -> &[OpaqueTerm] {
        &self.env
    }
}
