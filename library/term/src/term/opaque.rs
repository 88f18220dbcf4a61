use core::fmt;

use static_assertions::assert_eq_size;

use super::header::Subtag;
use super::tag::{self, PrimaryTag};

/// An opaque term is a single machine word holding an encoded term of any kind.
///
/// The low bits of the word carry the primary tag, which decides how the rest
/// of the word is to be read: as an immediate value, as a pointer to a cons
/// cell or boxed aggregate, or as the header word of an aggregate. Headers
/// are never held by variables; they only ever appear as the first word of
/// an aggregate on a heap.
///
/// Constructing a term word from any bit pattern is safe, since a term word
/// owns nothing. Only following the pointers held by boxed and list words
/// requires the caller to know that the pointee is live.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OpaqueTerm(usize);

assert_eq_size!(OpaqueTerm, usize);

impl OpaqueTerm {
    /// The empty list
    pub const NIL: Self = Self(tag::NIL);

    /// Returns this term as a raw word
    #[inline(always)]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Reinterprets a raw word as a term
    #[inline(always)]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Binary for OpaqueTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

impl fmt::Debug for OpaqueTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let raw = self.0;
        match self.primary_tag() {
            PrimaryTag::Header => match Subtag::from_header_tag(raw) {
                Some(subtag) => write!(f, "Header({:?}, {})", subtag, self.header_arity()),
                None => write!(f, "InvalidHeader({:#x})", raw),
            },
            PrimaryTag::List => write!(
                f,
                "List({:#x}{})",
                raw & tag::PTR_MASK,
                if self.is_literal() { ", literal" } else { "" }
            ),
            PrimaryTag::Boxed => write!(
                f,
                "Box({:#x}{})",
                raw & tag::PTR_MASK,
                if self.is_literal() { ", literal" } else { "" }
            ),
            PrimaryTag::Immediate => {
                if self.is_small() {
                    write!(f, "Small({})", self.signed_val())
                } else if self.is_local_pid() {
                    write!(f, "Pid({})", self.local_pid_val())
                } else if self.is_local_port() {
                    write!(f, "Port({})", self.local_port_val())
                } else if self.is_nil() {
                    f.write_str("Nil")
                } else if self.is_atom() {
                    write!(f, "Atom({})", self.atom_val())
                } else if self.is_catch() {
                    write!(f, "Catch({})", self.catch_val())
                } else {
                    write!(f, "InvalidImmediate({:#x})", raw)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::term::Header;

    use super::*;

    #[test]
    fn debug_formatting() {
        assert_eq!(format!("{:?}", OpaqueTerm::small(-3)), "Small(-3)");
        assert_eq!(format!("{:?}", OpaqueTerm::atom(12)), "Atom(12)");
        assert_eq!(format!("{:?}", OpaqueTerm::NIL), "Nil");
        assert_eq!(
            format!("{:?}", OpaqueTerm::from(Header::arityval(2))),
            "Header(Arityval, 2)"
        );
        assert_eq!(format!("{:?}", OpaqueTerm::from_raw(0x2b)), "InvalidImmediate(0x2b)");
        assert_eq!(format!("{:?}", OpaqueTerm::from_raw(0x1c)), "InvalidHeader(0x1c)");
    }
}
