//! This crate implements the in-memory representation of terms: the word
//! tagging scheme, the layouts of boxed aggregates, the checked accessors
//! that narrow a term word to one of those layouts, and the marking of
//! literal data.
//!
//! A term is a single machine word (`OpaqueTerm`). Its low bits say whether
//! it is an immediate value, a pointer to a cons cell, a pointer to a boxed
//! aggregate, or the header word at the start of such an aggregate. Boxed
//! aggregates are built on a `HeapFragment` or `LiteralArea` via
//! `TermAlloc`, and shared objects outside any heap (`Node`,
//! `MagicBinary`, `OffHeapBinary`) are reference counted and tracked by the
//! `OffHeap` list of the heap pointing at them.
//!
//! Call `verify_representation_invariants` once at startup, before any term
//! is built.
pub mod arch;
mod error;
pub mod heap;
mod init;
pub mod offheap;
pub mod term;

pub use self::error::{HeapError, InvariantError, TermDecodingError, TermEncodingError};
pub use self::heap::{HeapFragment, LiteralArea, TermAlloc};
pub use self::init::{
    check_representation, enforce_representation, verify_representation_invariants,
    InvariantConfig,
};
pub use self::offheap::{MagicBinary, Node, OffHeap, OffHeapBinary};
pub use self::term::{
    tag_literals, tag_literals_raw, Family, Header, OpaqueTerm, PrimaryTag, Subtag, TypedTerm,
};
