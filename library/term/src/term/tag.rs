//! Primary tag dispatch and the immediate encodings.
//!
//! The low two bits of every term word select one of four primary tags:
//!
//! * `00` header, the first word of an aggregate
//! * `01` list, a pointer to a cons cell
//! * `10` boxed, a pointer to an aggregate starting with a header
//! * `11` immediate, the value is held entirely in the word
//!
//! Immediates are further split by the low four bits (immediate-1) into
//! local pids, local ports, small integers and the immediate-2 space, which
//! in turn is split by the low six bits into atoms, catch markers and nil.
use crate::arch::{self, MIN_ALIGN};
use crate::error::TermEncodingError;

use super::OpaqueTerm;

pub const PRIMARY_SIZE: u32 = 2;
pub const PRIMARY_MASK: usize = 0x3;
pub const TAG_PRIMARY_HEADER: usize = 0x0;
pub const TAG_PRIMARY_LIST: usize = 0x1;
pub const TAG_PRIMARY_BOXED: usize = 0x2;
pub const TAG_PRIMARY_IMMED1: usize = 0x3;

pub const IMMED1_SIZE: u32 = 4;
pub const IMMED1_MASK: usize = 0xF;
pub const IMMED1_PID: usize = (0x0 << PRIMARY_SIZE) | TAG_PRIMARY_IMMED1;
pub const IMMED1_PORT: usize = (0x1 << PRIMARY_SIZE) | TAG_PRIMARY_IMMED1;
pub const IMMED1_IMMED2: usize = (0x2 << PRIMARY_SIZE) | TAG_PRIMARY_IMMED1;
pub const IMMED1_SMALL: usize = (0x3 << PRIMARY_SIZE) | TAG_PRIMARY_IMMED1;

pub const IMMED2_SIZE: u32 = 6;
pub const IMMED2_MASK: usize = 0x3F;
pub const IMMED2_ATOM: usize = (0x0 << IMMED1_SIZE) | IMMED1_IMMED2;
pub const IMMED2_CATCH: usize = (0x1 << IMMED1_SIZE) | IMMED1_IMMED2;
pub const IMMED2_NIL: usize = (0x3 << IMMED1_SIZE) | IMMED1_IMMED2;

/// The empty list; every payload bit is set
pub const NIL: usize = (!0 << IMMED2_SIZE) | IMMED2_NIL;

/// Clears the primary tag and literal bit from a pointer-shaped word
pub const PTR_MASK: usize = !(PRIMARY_MASK | arch::LITERAL_TAG);

pub const MIN_SMALL: isize = isize::MIN >> IMMED1_SIZE;
pub const MAX_SMALL: isize = isize::MAX >> IMMED1_SIZE;
pub const MAX_PID_NUMBER: usize = usize::MAX >> IMMED1_SIZE;
pub const MAX_PORT_NUMBER: usize = usize::MAX >> IMMED1_SIZE;
pub const MAX_ATOM_INDEX: usize = usize::MAX >> IMMED2_SIZE;
pub const MAX_CATCH_INDEX: usize = usize::MAX >> IMMED2_SIZE;

/// The four primary classes of term word
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PrimaryTag {
    Header = TAG_PRIMARY_HEADER,
    List = TAG_PRIMARY_LIST,
    Boxed = TAG_PRIMARY_BOXED,
    Immediate = TAG_PRIMARY_IMMED1,
}

/// Returns true if `ptr` can be stored in a boxed or list word
#[inline]
pub const fn is_taggable_pointer(ptr: usize) -> bool {
    ptr != 0 && ptr & (MIN_ALIGN - 1) == 0
}

#[inline]
pub(crate) const fn in_small_range(value: isize) -> bool {
    value >= MIN_SMALL && value <= MAX_SMALL
}

#[inline]
const fn fits_immed1(value: usize) -> bool {
    value <= MAX_PID_NUMBER
}

#[inline]
const fn fits_immed2(value: usize) -> bool {
    value <= MAX_ATOM_INDEX
}

impl OpaqueTerm {
    /// Returns the primary tag of this word. Every bit pattern has one.
    #[inline(always)]
    pub const fn primary_tag(self) -> PrimaryTag {
        match self.raw() & PRIMARY_MASK {
            TAG_PRIMARY_HEADER => PrimaryTag::Header,
            TAG_PRIMARY_LIST => PrimaryTag::List,
            TAG_PRIMARY_BOXED => PrimaryTag::Boxed,
            _ => PrimaryTag::Immediate,
        }
    }

    #[inline(always)]
    pub const fn is_header(self) -> bool {
        self.raw() & PRIMARY_MASK == TAG_PRIMARY_HEADER
    }

    /// Returns true if this is a pointer to a cons cell, i.e. a non-empty list
    #[inline(always)]
    pub const fn is_list(self) -> bool {
        self.raw() & PRIMARY_MASK == TAG_PRIMARY_LIST
    }

    #[inline(always)]
    pub const fn is_boxed(self) -> bool {
        self.raw() & PRIMARY_MASK == TAG_PRIMARY_BOXED
    }

    #[inline(always)]
    pub const fn is_immediate(self) -> bool {
        self.raw() & PRIMARY_MASK == TAG_PRIMARY_IMMED1
    }

    #[inline(always)]
    pub const fn is_nil(self) -> bool {
        self.raw() == NIL
    }

    #[inline(always)]
    pub const fn is_small(self) -> bool {
        self.raw() & IMMED1_MASK == IMMED1_SMALL
    }

    #[inline(always)]
    pub const fn is_atom(self) -> bool {
        self.raw() & IMMED2_MASK == IMMED2_ATOM
    }

    #[inline(always)]
    pub const fn is_catch(self) -> bool {
        self.raw() & IMMED2_MASK == IMMED2_CATCH
    }

    #[inline(always)]
    pub const fn is_local_pid(self) -> bool {
        self.raw() & IMMED1_MASK == IMMED1_PID
    }

    #[inline(always)]
    pub const fn is_local_port(self) -> bool {
        self.raw() & IMMED1_MASK == IMMED1_PORT
    }

    /// Returns true if this is a boxed or list pointer into a literal area.
    ///
    /// Always false on targets without a literal bit.
    #[inline(always)]
    pub const fn is_literal(self) -> bool {
        arch::HAS_LITERAL_TAG
            && (self.is_boxed() || self.is_list())
            && self.raw() & arch::LITERAL_TAG == arch::LITERAL_TAG
    }

    /// Returns this pointer-shaped word with the literal bit set
    #[inline]
    pub(crate) const fn with_literal_tag(self) -> Self {
        Self::from_raw(self.raw() | arch::LITERAL_TAG)
    }

    /// Encodes a small integer.
    ///
    /// The value must lie within `MIN_SMALL..=MAX_SMALL`; use `TryFrom` when
    /// the range has not been established by the caller.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn small(value: isize) -> Self {
        precondition!(in_small_range(value));
        Self::from_raw(((value as usize) << IMMED1_SIZE) | IMMED1_SMALL)
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn signed_val(self) -> isize {
        precondition!(self.is_small());
        (self.raw() as isize) >> IMMED1_SIZE
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn unsigned_val(self) -> usize {
        precondition!(self.is_small());
        self.raw() >> IMMED1_SIZE
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn atom(index: usize) -> Self {
        precondition!(fits_immed2(index));
        Self::from_raw((index << IMMED2_SIZE) | IMMED2_ATOM)
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn atom_val(self) -> usize {
        precondition!(self.is_atom());
        self.raw() >> IMMED2_SIZE
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn catch(index: usize) -> Self {
        precondition!(fits_immed2(index));
        Self::from_raw((index << IMMED2_SIZE) | IMMED2_CATCH)
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn catch_val(self) -> usize {
        precondition!(self.is_catch());
        self.raw() >> IMMED2_SIZE
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn local_pid(number: usize) -> Self {
        precondition!(fits_immed1(number));
        Self::from_raw((number << IMMED1_SIZE) | IMMED1_PID)
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn local_pid_val(self) -> usize {
        precondition!(self.is_local_pid());
        self.raw() >> IMMED1_SIZE
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn local_port(number: usize) -> Self {
        precondition!(fits_immed1(number));
        Self::from_raw((number << IMMED1_SIZE) | IMMED1_PORT)
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn local_port_val(self) -> usize {
        precondition!(self.is_local_port());
        self.raw() >> IMMED1_SIZE
    }

    /// Encodes an atom index, failing if it does not fit in an immediate
    pub fn try_atom(index: usize) -> Result<Self, TermEncodingError> {
        if fits_immed2(index) {
            Ok(Self::atom(index))
        } else {
            Err(TermEncodingError::ValueOutOfRange)
        }
    }
}

impl TryFrom<isize> for OpaqueTerm {
    type Error = TermEncodingError;

    fn try_from(value: isize) -> Result<Self, Self::Error> {
        if in_small_range(value) {
            Ok(Self::small(value))
        } else {
            Err(TermEncodingError::ValueOutOfRange)
        }
    }
}

impl TryFrom<i64> for OpaqueTerm {
    type Error = TermEncodingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value: isize = value
            .try_into()
            .map_err(|_| TermEncodingError::ValueOutOfRange)?;
        value.try_into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn primary_tag_is_total() {
        let words = [0usize, 1, 2, 3, 0x10, 0x11, 0x12, 0x13, usize::MAX, NIL];
        for word in words {
            let term = OpaqueTerm::from_raw(word);
            let expected = match word & 0x3 {
                0 => PrimaryTag::Header,
                1 => PrimaryTag::List,
                2 => PrimaryTag::Boxed,
                _ => PrimaryTag::Immediate,
            };
            assert_eq!(term.primary_tag(), expected);
            let hits = [
                term.is_header(),
                term.is_list(),
                term.is_boxed(),
                term.is_immediate(),
            ];
            assert_eq!(hits.iter().filter(|hit| **hit).count(), 1);
        }
    }

    #[test]
    fn small_integer_roundtrip() {
        let term = OpaqueTerm::small(42);
        assert!(term.is_small());
        assert_eq!(term.primary_tag(), PrimaryTag::Immediate);
        assert_eq!(term.signed_val(), 42);
        assert_eq!(term.unsigned_val(), 42);

        let term = OpaqueTerm::small(-42);
        assert_eq!(term.signed_val(), -42);

        assert_eq!(OpaqueTerm::small(MIN_SMALL).signed_val(), MIN_SMALL);
        assert_eq!(OpaqueTerm::small(MAX_SMALL).signed_val(), MAX_SMALL);
    }

    #[test]
    fn small_integer_range_is_enforced_by_try_from() {
        assert_eq!(
            OpaqueTerm::try_from(MAX_SMALL + 1),
            Err(TermEncodingError::ValueOutOfRange)
        );
        assert_eq!(
            OpaqueTerm::try_from(MIN_SMALL - 1),
            Err(TermEncodingError::ValueOutOfRange)
        );
        assert_eq!(OpaqueTerm::try_from(-1isize), Ok(OpaqueTerm::small(-1)));
        assert_eq!(MIN_SMALL, -(1 << (arch::WORD_BITS - 5)));
    }

    #[test]
    fn immediate_kinds_are_disjoint() {
        let atom = OpaqueTerm::atom(7);
        let catch = OpaqueTerm::catch(7);
        let pid = OpaqueTerm::local_pid(7);
        let port = OpaqueTerm::local_port(7);
        let small = OpaqueTerm::small(7);
        let nil = OpaqueTerm::NIL;

        for term in [atom, catch, pid, port, small, nil] {
            assert!(term.is_immediate());
            let hits = [
                term.is_atom(),
                term.is_catch(),
                term.is_local_pid(),
                term.is_local_port(),
                term.is_small(),
                term.is_nil(),
            ];
            assert_eq!(hits.iter().filter(|hit| **hit).count(), 1, "{:?}", term);
        }

        assert_eq!(atom.atom_val(), 7);
        assert_eq!(catch.catch_val(), 7);
        assert_eq!(pid.local_pid_val(), 7);
        assert_eq!(port.local_port_val(), 7);
    }

    #[test]
    fn atom_index_range() {
        assert_eq!(
            OpaqueTerm::try_atom(MAX_ATOM_INDEX).map(|a| a.atom_val()),
            Ok(MAX_ATOM_INDEX)
        );
        assert_eq!(
            OpaqueTerm::try_atom(MAX_ATOM_INDEX + 1),
            Err(TermEncodingError::ValueOutOfRange)
        );
    }

    #[cfg(any(debug_assertions, feature = "checked"))]
    #[test]
    #[should_panic(expected = "precondition failed: is_small")]
    fn signed_val_of_atom_is_rejected() {
        OpaqueTerm::atom(1).signed_val();
    }

    #[test]
    fn taggable_pointers() {
        assert!(!is_taggable_pointer(0));
        assert!(!is_taggable_pointer(MIN_ALIGN + 2));
        assert!(is_taggable_pointer(MIN_ALIGN * 4));
    }
}
