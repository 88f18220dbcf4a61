//! Constants for 32-bit targets.
//!
//! Term allocations are only word aligned here, so the two low bits hold
//! the primary tag and there is no spare bit left for marking literals.
//! Literal tagging is therefore disabled on these targets.

/// The minimum alignment of every term allocation
pub const MIN_ALIGN: usize = 4;

/// Whether pointer-shaped terms have a spare bit for marking literals
pub const HAS_LITERAL_TAG: bool = false;

/// There is no literal bit on this platform, so it masks nothing
pub const LITERAL_TAG: usize = 0;

/// The number of words occupied by the payload of a boxed float
pub const FLOAT_WORDS: usize = 2;

/// The number of 32-bit numbers carried by a reference
pub const REF_NUMBERS: usize = 3;

/// Ordinary and magic references differ in size on this platform, and are
/// told apart by their header arity alone
pub const REF_MARKER_DISCIPLINE: bool = false;

/// Arity of an ordinary (non-magic) internal reference thing
pub const ORDINARY_REF_ARITY: usize = 3;

/// Arity of a magic (resource-backed) internal reference thing
pub const MAGIC_REF_ARITY: usize = 2;
