//! Header words and the subtag registry.
//!
//! A header word has the primary tag `00`, a four-bit subtag in bits 2..6
//! and the arity in the remaining high bits. The six low bits together form
//! the header tag, which is what the predicates in this module compare
//! against. Headers whose subtag is not `Arityval` are called *things*:
//! their arity counts raw words which are not necessarily terms.
//!
//! Subtags are grouped in families (bignums, bit strings, externals) whose
//! members can be recognized with a single mask-and-compare. The masks are
//! only sound as long as the subtag numbering keeps each family disjoint
//! from every other subtag, which is asserted here at compile time and
//! again over the full cross product by the startup check.
use core::fmt;

use static_assertions::const_assert_eq;

use super::tag::{PRIMARY_MASK, PRIMARY_SIZE, TAG_PRIMARY_HEADER};
use super::OpaqueTerm;

pub const HEADER_SUBTAG_SIZE: u32 = 4;
pub const HEADER_TAG_MASK: usize = 0x3F;
pub const HEADER_ARITY_OFFSET: u32 = PRIMARY_SIZE + HEADER_SUBTAG_SIZE;

/// The largest arity a header can carry
pub const MAX_ARITY: usize = usize::MAX >> HEADER_ARITY_OFFSET;

const fn subtag(n: usize) -> usize {
    (n << PRIMARY_SIZE) | TAG_PRIMARY_HEADER
}

pub const ARITYVAL_SUBTAG: usize = subtag(0x0);
pub const BIN_REF_SUBTAG: usize = subtag(0x1);
pub const POS_BIG_SUBTAG: usize = subtag(0x2);
pub const NEG_BIG_SUBTAG: usize = subtag(0x3);
pub const REF_SUBTAG: usize = subtag(0x4);
pub const FUN_SUBTAG: usize = subtag(0x5);
pub const FLOAT_SUBTAG: usize = subtag(0x6);
pub const HEAP_BITS_SUBTAG: usize = subtag(0x8);
pub const SUB_BITS_SUBTAG: usize = subtag(0x9);
pub const MAP_SUBTAG: usize = subtag(0xB);
pub const EXTERNAL_PID_SUBTAG: usize = subtag(0xC);
pub const EXTERNAL_PORT_SUBTAG: usize = subtag(0xD);
pub const EXTERNAL_REF_SUBTAG: usize = subtag(0xE);

/// Distinguishes negative from positive bignums
pub const BIG_SIGN_BIT: usize = 0x1 << PRIMARY_SIZE;
pub const BIG_TAG_MASK: usize = HEADER_TAG_MASK & !BIG_SIGN_BIT;
pub const BITSTRING_TAG_MASK: usize = HEADER_TAG_MASK & !(0x1 << PRIMARY_SIZE);
pub const EXTERNAL_TAG_MASK: usize = HEADER_TAG_MASK & !(0x3 << PRIMARY_SIZE);

const_assert_eq!(BIG_TAG_MASK, 0x3B);
const_assert_eq!(BITSTRING_TAG_MASK, 0x3B);
const_assert_eq!(EXTERNAL_TAG_MASK, 0x33);

const_assert_eq!(POS_BIG_SUBTAG & BIG_TAG_MASK, POS_BIG_SUBTAG);
const_assert_eq!(NEG_BIG_SUBTAG & BIG_TAG_MASK, POS_BIG_SUBTAG);
const_assert_eq!(HEAP_BITS_SUBTAG & BITSTRING_TAG_MASK, HEAP_BITS_SUBTAG);
const_assert_eq!(SUB_BITS_SUBTAG & BITSTRING_TAG_MASK, HEAP_BITS_SUBTAG);
const_assert_eq!(EXTERNAL_PID_SUBTAG & EXTERNAL_TAG_MASK, EXTERNAL_PID_SUBTAG);
const_assert_eq!(EXTERNAL_PORT_SUBTAG & EXTERNAL_TAG_MASK, EXTERNAL_PID_SUBTAG);
const_assert_eq!(EXTERNAL_REF_SUBTAG & EXTERNAL_TAG_MASK, EXTERNAL_PID_SUBTAG);

/// The kind of aggregate described by a header word
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Subtag {
    Arityval = ARITYVAL_SUBTAG,
    BinRef = BIN_REF_SUBTAG,
    PosBig = POS_BIG_SUBTAG,
    NegBig = NEG_BIG_SUBTAG,
    Ref = REF_SUBTAG,
    Fun = FUN_SUBTAG,
    Float = FLOAT_SUBTAG,
    HeapBits = HEAP_BITS_SUBTAG,
    SubBits = SUB_BITS_SUBTAG,
    Map = MAP_SUBTAG,
    ExternalPid = EXTERNAL_PID_SUBTAG,
    ExternalPort = EXTERNAL_PORT_SUBTAG,
    ExternalRef = EXTERNAL_REF_SUBTAG,
}
impl Subtag {
    pub const ALL: [Self; 13] = [
        Self::Arityval,
        Self::BinRef,
        Self::PosBig,
        Self::NegBig,
        Self::Ref,
        Self::Fun,
        Self::Float,
        Self::HeapBits,
        Self::SubBits,
        Self::Map,
        Self::ExternalPid,
        Self::ExternalPort,
        Self::ExternalRef,
    ];

    /// Returns the header tag bits of this subtag
    #[inline(always)]
    pub const fn bits(self) -> usize {
        self as usize
    }

    /// Decodes the header tag of `word`, returning `None` for non-header
    /// words and for unassigned subtag patterns
    pub const fn from_header_tag(word: usize) -> Option<Self> {
        match word & HEADER_TAG_MASK {
            ARITYVAL_SUBTAG => Some(Self::Arityval),
            BIN_REF_SUBTAG => Some(Self::BinRef),
            POS_BIG_SUBTAG => Some(Self::PosBig),
            NEG_BIG_SUBTAG => Some(Self::NegBig),
            REF_SUBTAG => Some(Self::Ref),
            FUN_SUBTAG => Some(Self::Fun),
            FLOAT_SUBTAG => Some(Self::Float),
            HEAP_BITS_SUBTAG => Some(Self::HeapBits),
            SUB_BITS_SUBTAG => Some(Self::SubBits),
            MAP_SUBTAG => Some(Self::Map),
            EXTERNAL_PID_SUBTAG => Some(Self::ExternalPid),
            EXTERNAL_PORT_SUBTAG => Some(Self::ExternalPort),
            EXTERNAL_REF_SUBTAG => Some(Self::ExternalRef),
            _ => None,
        }
    }

    /// Everything but a tuple header is a thing
    #[inline]
    pub const fn is_thing(self) -> bool {
        !matches!(self, Self::Arityval)
    }

    pub const fn family(self) -> Option<Family> {
        match self {
            Self::PosBig | Self::NegBig => Some(Family::Bignum),
            Self::HeapBits | Self::SubBits => Some(Family::Bitstring),
            Self::ExternalPid | Self::ExternalPort | Self::ExternalRef => Some(Family::External),
            _ => None,
        }
    }
}

/// A group of subtags recognized by a single mask-and-compare
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Family {
    Bignum,
    Bitstring,
    External,
}
impl Family {
    pub const ALL: [Self; 3] = [Self::Bignum, Self::Bitstring, Self::External];

    pub const fn mask(self) -> usize {
        match self {
            Self::Bignum => BIG_TAG_MASK,
            Self::Bitstring => BITSTRING_TAG_MASK,
            Self::External => EXTERNAL_TAG_MASK,
        }
    }

    /// The member whose tag bits every member reduces to under the mask
    pub const fn representative(self) -> Subtag {
        match self {
            Self::Bignum => Subtag::PosBig,
            Self::Bitstring => Subtag::HeapBits,
            Self::External => Subtag::ExternalPid,
        }
    }

    pub const fn members(self) -> &'static [Subtag] {
        match self {
            Self::Bignum => &[Subtag::PosBig, Subtag::NegBig],
            Self::Bitstring => &[Subtag::HeapBits, Subtag::SubBits],
            Self::External => &[
                Subtag::ExternalPid,
                Subtag::ExternalPort,
                Subtag::ExternalRef,
            ],
        }
    }

    /// Membership as decided by the enum definitions
    pub fn contains(self, subtag: Subtag) -> bool {
        self.members().contains(&subtag)
    }

    /// Membership as decided by the mask, which is what the header
    /// predicates use
    #[inline(always)]
    pub const fn matches(self, word: usize) -> bool {
        word & self.mask() == self.representative().bits()
    }
}

/// A typed header word
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Header(OpaqueTerm);
impl Header {
    /// Builds the header of a thing with the given subtag and arity
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn new(subtag: Subtag, arity: usize) -> Self {
        precondition!(fits_arity(arity));
        Self(OpaqueTerm::from_raw(
            (arity << HEADER_ARITY_OFFSET) | subtag.bits(),
        ))
    }

    /// Builds the header of a tuple with `arity` elements
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn arityval(arity: usize) -> Self {
        Self::new(Subtag::Arityval, arity)
    }

    /// Reinterprets a header word, returning `None` if it isn't one or its
    /// subtag is unassigned
    pub fn from_term(term: OpaqueTerm) -> Option<Self> {
        if term.is_header() && Subtag::from_header_tag(term.raw()).is_some() {
            Some(Self(term))
        } else {
            None
        }
    }

    pub fn subtag(self) -> Subtag {
        self.0.thing_subtag_unchecked()
    }

    pub fn arity(self) -> usize {
        self.0.header_arity()
    }

    #[inline(always)]
    pub const fn as_term(self) -> OpaqueTerm {
        self.0
    }
}
impl From<Header> for OpaqueTerm {
    #[inline(always)]
    fn from(header: Header) -> Self {
        header.0
    }
}
impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Header<{:?}>({})", self.subtag(), self.arity())
    }
}

#[inline]
const fn fits_arity(arity: usize) -> bool {
    arity <= MAX_ARITY
}

#[cold]
#[inline(never)]
fn invalid_header_tag(word: usize) -> ! {
    panic!("invalid header tag in word {:#x}", word)
}

impl OpaqueTerm {
    /// Returns the six header tag bits of this word
    #[inline(always)]
    pub const fn header_tag(self) -> usize {
        self.raw() & HEADER_TAG_MASK
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn header_arity(self) -> usize {
        precondition!(self.is_header());
        self.raw() >> HEADER_ARITY_OFFSET
    }

    /// Returns the element count of a tuple header
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn arityval(self) -> usize {
        precondition!(self.is_arity_value());
        self.raw() >> HEADER_ARITY_OFFSET
    }

    #[inline(always)]
    pub const fn is_arity_value(self) -> bool {
        self.raw() & HEADER_TAG_MASK == ARITYVAL_SUBTAG
    }

    #[inline(always)]
    pub const fn is_thing(self) -> bool {
        self.raw() & PRIMARY_MASK == TAG_PRIMARY_HEADER && !self.is_arity_value()
    }

    /// Returns the number of words following a thing header
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn thing_arityval(self) -> usize {
        precondition!(self.is_thing());
        self.raw() >> HEADER_ARITY_OFFSET
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn thing_subtag(self) -> Subtag {
        precondition!(self.is_thing());
        self.thing_subtag_unchecked()
    }

    fn thing_subtag_unchecked(self) -> Subtag {
        match Subtag::from_header_tag(self.raw()) {
            Some(subtag) => subtag,
            None => invalid_header_tag(self.raw()),
        }
    }

    #[inline(always)]
    pub const fn is_big_header(self) -> bool {
        Family::Bignum.matches(self.raw())
    }

    #[inline(always)]
    pub const fn is_bitstring_header(self) -> bool {
        Family::Bitstring.matches(self.raw())
    }

    #[inline(always)]
    pub const fn is_external_header(self) -> bool {
        Family::External.matches(self.raw())
    }

    #[inline(always)]
    pub const fn is_ref_header(self) -> bool {
        self.raw() & HEADER_TAG_MASK == REF_SUBTAG
    }

    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn bignum_header_is_neg(self) -> bool {
        precondition!(self.is_big_header());
        self.raw() & BIG_SIGN_BIT == BIG_SIGN_BIT
    }

    /// Returns this bignum header with the sign bit set
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn bignum_header_neg(self) -> Self {
        precondition!(self.is_big_header());
        Self::from_raw(self.raw() | BIG_SIGN_BIT)
    }

    /// Returns the number of digit words of a bignum
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn bignum_header_arity(self) -> usize {
        precondition!(self.is_big_header());
        self.raw() >> HEADER_ARITY_OFFSET
    }
}

macro_rules! subtag_predicates {
    ($($kind:ident => $subtag:ident),* $(,)?) => {
        paste::paste! {
            impl OpaqueTerm {
                $(
                    #[inline(always)]
                    pub const fn [<is_ $kind _header>](self) -> bool {
                        self.raw() & HEADER_TAG_MASK == [<$subtag _SUBTAG>]
                    }
                )*
            }
        }
    };
}

subtag_predicates! {
    bin_ref => BIN_REF,
    fun => FUN,
    float => FLOAT,
    heap_bits => HEAP_BITS,
    sub_bits => SUB_BITS,
    map => MAP,
    external_pid => EXTERNAL_PID,
    external_port => EXTERNAL_PORT,
    external_ref => EXTERNAL_REF,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn family_masks_partition_subtags() {
        for subtag in Subtag::ALL {
            for family in Family::ALL {
                assert_eq!(
                    family.matches(subtag.bits()),
                    family.contains(subtag),
                    "{:?} vs {:?}",
                    family,
                    subtag
                );
            }
            assert_eq!(
                subtag.family(),
                Family::ALL.into_iter().find(|f| f.contains(subtag))
            );
        }
    }

    #[test]
    fn family_masks_hold_for_any_arity() {
        for subtag in Subtag::ALL {
            let word = Header::new(subtag, MAX_ARITY).as_term();
            assert_eq!(word.is_big_header(), subtag.family() == Some(Family::Bignum));
            assert_eq!(
                word.is_bitstring_header(),
                subtag.family() == Some(Family::Bitstring)
            );
            assert_eq!(
                word.is_external_header(),
                subtag.family() == Some(Family::External)
            );
        }
    }

    #[test]
    fn unassigned_subtags_do_not_decode() {
        for n in [0x7usize, 0xA, 0xF] {
            assert_eq!(Subtag::from_header_tag(n << 2), None);
            assert_eq!(Header::from_term(OpaqueTerm::from_raw(n << 2)), None);
        }
    }

    #[test]
    fn header_fields() {
        let tuple = Header::arityval(3).as_term();
        assert!(tuple.is_header());
        assert!(tuple.is_arity_value());
        assert!(!tuple.is_thing());
        assert_eq!(tuple.arityval(), 3);
        assert_eq!(tuple.header_arity(), 3);

        let float = Header::new(Subtag::Float, 1).as_term();
        assert!(float.is_thing());
        assert!(float.is_float_header());
        assert_eq!(float.thing_subtag(), Subtag::Float);
        assert_eq!(float.thing_arityval(), 1);

        let sub = Header::new(Subtag::SubBits, 4).as_term();
        assert!(sub.is_sub_bits_header());
        assert!(sub.is_bitstring_header());
        assert!(!sub.is_heap_bits_header());
    }

    #[test]
    fn bignum_sign() {
        let pos = Header::new(Subtag::PosBig, 2).as_term();
        assert!(!pos.bignum_header_is_neg());
        let neg = pos.bignum_header_neg();
        assert!(neg.bignum_header_is_neg());
        assert_eq!(neg.thing_subtag(), Subtag::NegBig);
        assert_eq!(neg.bignum_header_arity(), 2);
    }

    #[cfg(any(debug_assertions, feature = "checked"))]
    #[test]
    #[should_panic(expected = "precondition failed: is_arity_value")]
    fn arityval_of_thing_is_rejected() {
        Header::new(Subtag::Map, 1).as_term().arityval();
    }
}
