//! Regions terms are built into.
//!
//! `HeapFragment` is a standalone block of term words with its own off-heap
//! list. `LiteralArea` wraps a fragment whose contents become literals once
//! sealed. Both build terms through the `TermAlloc` trait.
mod alloc;
mod fragment;
mod literal;

pub use self::alloc::TermAlloc;
pub use self::fragment::HeapFragment;
pub use self::literal::LiteralArea;
