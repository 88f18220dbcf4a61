use core::ptr::{self, NonNull};

use super::OpaqueTerm;

/// A bignum: a positive or negative bignum header followed by its magnitude,
/// least significant digit first
#[repr(C)]
pub struct BigInt {
    header: OpaqueTerm,
    digits: [usize],
}
impl BigInt {
    /// # Safety
    ///
    /// `ptr` must point to a live bignum header followed by its digits.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let arity = (*ptr).bignum_header_arity();
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr as *mut usize, arity) as *mut Self)
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.header.bignum_header_is_neg()
    }

    #[inline]
    pub fn digits(&self) -> &[usize] {
        &self.digits
    }

    /// Returns the value as an `i128` if the magnitude fits
    pub fn to_i128(&self) -> Option<i128> {
        let mut magnitude = 0u128;
        for (i, digit) in self.digits.iter().copied().enumerate() {
            let shift = i as u32 * usize::BITS;
            if digit != 0 && shift >= u128::BITS {
                return None;
            }
            if shift < u128::BITS {
                magnitude |= (digit as u128) << shift;
            }
        }
        if self.is_negative() {
            if magnitude > i128::MAX as u128 + 1 {
                None
            } else {
                Some((magnitude as i128).wrapping_neg())
            }
        } else {
            i128::try_from(magnitude).ok()
        }
    }
}
