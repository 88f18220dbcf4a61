//! This module exposes the platform facts the term encoding depends on,
//! selected by the configured target pointer width.
//!
//! Everything that differs between 32-bit and 64-bit targets lives behind
//! this module, so the rest of the crate can be written against `usize`
//! words without caring which platform it was built for.
use core::mem;

use static_assertions::const_assert;

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        mod arch_64;
        pub use self::arch_64::*;
    } else if #[cfg(target_pointer_width = "32")] {
        mod arch_32;
        pub use self::arch_32::*;
    } else {
        compile_error!("unsupported target pointer width");
    }
}

/// The size in bytes of a term word
pub const WORD_SIZE: usize = mem::size_of::<usize>();

/// The number of bits in a term word
pub const WORD_BITS: u32 = usize::BITS;

// Pointer-shaped terms keep their tags in the low bits freed up by alignment
const_assert!(MIN_ALIGN >= 4);
const_assert!(MIN_ALIGN.is_power_of_two());
const_assert!(LITERAL_TAG < MIN_ALIGN);
const_assert!(mem::align_of::<usize>() <= MIN_ALIGN);

/// Converts a size in bytes to a size in words, rounding up
#[inline]
pub const fn to_word_size(bytes: usize) -> usize {
    (bytes + WORD_SIZE - 1) / WORD_SIZE
}
