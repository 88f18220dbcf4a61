use core::ptr::{self, NonNull};

use crate::arch::FLOAT_WORDS;

use super::{Header, OpaqueTerm, Subtag};

/// A boxed float. The payload spans `FLOAT_WORDS` words, which are only
/// guaranteed to be word aligned.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct Float {
    header: OpaqueTerm,
    bits: [usize; FLOAT_WORDS],
}
impl Float {
    pub fn new(value: f64) -> Self {
        let mut bits = [0; FLOAT_WORDS];
        unsafe {
            ptr::write_unaligned(bits.as_mut_ptr() as *mut f64, value);
        }
        Self {
            header: Header::new(Subtag::Float, FLOAT_WORDS).into(),
            bits,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to a live float header.
    #[inline]
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        NonNull::new_unchecked(ptr as *mut Self)
    }

    #[inline]
    pub fn value(&self) -> f64 {
        unsafe { ptr::read_unaligned(self.bits.as_ptr() as *const f64) }
    }
}
