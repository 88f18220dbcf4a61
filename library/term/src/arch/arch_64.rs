//! Constants for 64-bit targets.
//!
//! All term allocations are 8-byte aligned, which leaves the lowest 3 bits
//! of every pointer free. The primary tag occupies bits 0-1, and bit 2 is
//! reserved as the literal flag on boxed and list pointers.

/// The minimum alignment of every term allocation
pub const MIN_ALIGN: usize = 8;

/// Whether pointer-shaped terms have a spare bit for marking literals
pub const HAS_LITERAL_TAG: bool = true;

/// The bit set on boxed/list pointers which target a literal area
pub const LITERAL_TAG: usize = 0x4;

/// The number of words occupied by the payload of a boxed float
pub const FLOAT_WORDS: usize = 1;

/// The number of 32-bit numbers carried by a reference
pub const REF_NUMBERS: usize = 3;

/// Ordinary and magic references have the same size on this platform, and
/// are told apart by the marker slot of the ordinary layout
pub const REF_MARKER_DISCIPLINE: bool = true;

/// Arity of an ordinary (non-magic) internal reference thing
pub const ORDINARY_REF_ARITY: usize = 2;

/// Arity of a magic (resource-backed) internal reference thing
pub const MAGIC_REF_ARITY: usize = 2;
