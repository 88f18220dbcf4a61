use thiserror::Error;

use crate::term::{Family, Subtag};

/// Represents the various conditions under which encoding can fail
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEncodingError {
    /// Occurs when attempting to encode an unaligned pointer
    #[error("invalid attempt to encode unaligned pointer")]
    InvalidAlignment,
    /// Occurs when attempting to encode a value that cannot fit
    /// within the encoded types valid range, e.g. an integer that
    /// is too large
    #[error("invalid attempt to encode a value outside the valid range")]
    ValueOutOfRange,
    /// Occurs when a term of the wrong kind is given where a specific
    /// kind is required, e.g. viewing the bits of something that isn't
    /// a bit string
    #[error("invalid attempt to encode a term of the wrong kind")]
    InvalidKind,
}

/// Used to indicate that some value was not a valid encoding of a term
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermDecodingError {
    /// Occurs with immediate and header tags, as some combinations of
    /// tag bits are unassigned
    #[error("invalid type tag")]
    InvalidTag,
    /// Header words only ever start an aggregate, they are never values
    #[error("tried to decode a header word as a value")]
    HeaderAsValue,
}

/// Errors raised while building terms on a heap fragment or literal area
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    #[error("unable to allocate {requested} words, only {available} available")]
    Exhausted { requested: usize, available: usize },
    #[error("invalid heap size of {0} words")]
    InvalidSize(usize),
    #[error("the system allocator could not provide {0} words")]
    OutOfMemory(usize),
    #[error("literal area is sealed")]
    Sealed,
    #[error("literal area holds an untagged pointer outside of it: {0:#x}")]
    ForeignPointer(usize),
    #[error(transparent)]
    Encoding(#[from] TermEncodingError),
}

/// A representation invariant the term encoding relies on does not hold
/// in this build
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    #[error("ordinary and magic reference layouts are inconsistent: {0}")]
    RefLayout(&'static str),
    #[error(
        "cannot differentiate between magic and ordinary references: \
         a magic reference to {pointer:#x} reads as marker {marker:#x}"
    )]
    MarkerCollision { marker: u32, pointer: usize },
    #[error("the {family:?} family mask {mask:#x} matches {subtag:?}, which is not a member")]
    FamilyOverlap {
        family: Family,
        subtag: Subtag,
        mask: usize,
    },
    #[error("the {family:?} family mask {mask:#x} does not match its member {subtag:?}")]
    FamilyMiss {
        family: Family,
        subtag: Subtag,
        mask: usize,
    },
    #[error("a header of maximum arity does not decode back to {0:?}")]
    ArityOverflow(Subtag),
}
