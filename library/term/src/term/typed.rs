use core::fmt;

use crate::error::TermDecodingError;

use super::*;

/// A term resolved to its concrete kind.
///
/// Immediates are decoded to their values; aggregates are borrowed in place
/// from the heap they live on.
pub enum TypedTerm<'a> {
    Nil,
    SmallInteger(isize),
    Atom(usize),
    Catch(usize),
    Pid(usize),
    Port(usize),
    List(&'a Cons),
    Tuple(&'a Tuple),
    BigInteger(&'a BigInt),
    Float(&'a Float),
    HeapBits(&'a HeapBits),
    SubBits(&'a SubBits),
    BinRef(&'a BinRef),
    Map(&'a FlatMap),
    Closure(&'a Closure),
    Reference(&'a OrdinaryRef),
    MagicReference(&'a MagicRef),
    ExternalPid(&'a ExternalThing),
    ExternalPort(&'a ExternalThing),
    ExternalReference(&'a ExternalThing),
}
impl<'a> TypedTerm<'a> {
    /// The name of this kind of term, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::SmallInteger(_) => "small_integer",
            Self::Atom(_) => "atom",
            Self::Catch(_) => "catch",
            Self::Pid(_) => "pid",
            Self::Port(_) => "port",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::BigInteger(_) => "big_integer",
            Self::Float(_) => "float",
            Self::HeapBits(_) => "heap_bits",
            Self::SubBits(_) => "sub_bits",
            Self::BinRef(_) => "bin_ref",
            Self::Map(_) => "map",
            Self::Closure(_) => "closure",
            Self::Reference(_) => "reference",
            Self::MagicReference(_) => "magic_reference",
            Self::ExternalPid(_) => "external_pid",
            Self::ExternalPort(_) => "external_port",
            Self::ExternalReference(_) => "external_reference",
        }
    }
}
impl fmt::Debug for TypedTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("Nil"),
            Self::SmallInteger(value) => write!(f, "SmallInteger({})", value),
            Self::Atom(index) => write!(f, "Atom({})", index),
            Self::Catch(index) => write!(f, "Catch({})", index),
            Self::Pid(number) => write!(f, "Pid({})", number),
            Self::Port(number) => write!(f, "Port({})", number),
            Self::List(cons) => write!(f, "List({:?})", cons),
            Self::Tuple(tuple) => write!(f, "Tuple({:?})", tuple.elements()),
            Self::BigInteger(big) => write!(
                f,
                "BigInteger({}{:?})",
                if big.is_negative() { "-" } else { "+" },
                big.digits()
            ),
            Self::Float(float) => write!(f, "Float({})", float.value()),
            Self::HeapBits(bits) => write!(f, "HeapBits({} bits)", bits.bit_size()),
            Self::SubBits(bits) => write!(
                f,
                "SubBits({}..{} of {:?})",
                bits.start(),
                bits.end(),
                bits.orig()
            ),
            Self::BinRef(bin) => write!(f, "BinRef({} bytes)", bin.as_bytes().len()),
            Self::Map(map) => write!(f, "Map({} entries)", map.len()),
            Self::Closure(closure) => write!(f, "Closure({}/{})", closure.index(), closure.arity()),
            Self::Reference(reference) => write!(f, "{:?}", reference),
            Self::MagicReference(reference) => write!(f, "{:?}", reference),
            Self::ExternalPid(thing)
            | Self::ExternalPort(thing)
            | Self::ExternalReference(thing) => write!(f, "{}({:?})", self.kind(), thing.data()),
        }
    }
}

impl OpaqueTerm {
    /// Resolves this term to its concrete kind.
    ///
    /// Header words are not values and fail to decode, as do words with an
    /// unassigned immediate or subtag pattern.
    ///
    /// # Safety
    ///
    /// If this is a boxed or list word, it must point to live heap data that
    /// outlives `'a` and is not mutated while borrowed.
    pub unsafe fn decode<'a>(self) -> Result<TypedTerm<'a>, TermDecodingError> {
        match self.primary_tag() {
            PrimaryTag::Header => Err(TermDecodingError::HeaderAsValue),
            PrimaryTag::List => Ok(TypedTerm::List(&*self.list_val())),
            PrimaryTag::Immediate => self.decode_immediate(),
            PrimaryTag::Boxed => self.decode_boxed(),
        }
    }

    fn decode_immediate<'a>(self) -> Result<TypedTerm<'a>, TermDecodingError> {
        if self.is_small() {
            Ok(TypedTerm::SmallInteger(self.signed_val()))
        } else if self.is_local_pid() {
            Ok(TypedTerm::Pid(self.local_pid_val()))
        } else if self.is_local_port() {
            Ok(TypedTerm::Port(self.local_port_val()))
        } else if self.is_nil() {
            Ok(TypedTerm::Nil)
        } else if self.is_atom() {
            Ok(TypedTerm::Atom(self.atom_val()))
        } else if self.is_catch() {
            Ok(TypedTerm::Catch(self.catch_val()))
        } else {
            Err(TermDecodingError::InvalidTag)
        }
    }

    unsafe fn decode_boxed<'a>(self) -> Result<TypedTerm<'a>, TermDecodingError> {
        let ptr = self.boxed_val();
        let header = *ptr;
        let subtag = Subtag::from_header_tag(header.raw()).ok_or(TermDecodingError::InvalidTag)?;
        let term = match subtag {
            Subtag::Arityval => TypedTerm::Tuple(Tuple::from_header(ptr).as_ref()),
            Subtag::PosBig | Subtag::NegBig => {
                TypedTerm::BigInteger(BigInt::from_header(ptr).as_ref())
            }
            Subtag::Float => TypedTerm::Float(Float::from_header(ptr).as_ref()),
            Subtag::HeapBits => TypedTerm::HeapBits(HeapBits::from_header(ptr).as_ref()),
            Subtag::SubBits => TypedTerm::SubBits(SubBits::from_header(ptr).as_ref()),
            Subtag::BinRef => TypedTerm::BinRef(BinRef::from_header(ptr).as_ref()),
            Subtag::Map => TypedTerm::Map(FlatMap::from_header(ptr).as_ref()),
            Subtag::Fun => TypedTerm::Closure(Closure::from_header(ptr).as_ref()),
            Subtag::Ref => {
                if RefThing::from_header(ptr).as_ref().is_magic() {
                    TypedTerm::MagicReference(MagicRef::from_header(ptr).as_ref())
                } else {
                    TypedTerm::Reference(OrdinaryRef::from_header(ptr).as_ref())
                }
            }
            Subtag::ExternalPid => TypedTerm::ExternalPid(ExternalThing::from_header(ptr).as_ref()),
            Subtag::ExternalPort => {
                TypedTerm::ExternalPort(ExternalThing::from_header(ptr).as_ref())
            }
            Subtag::ExternalRef => {
                TypedTerm::ExternalReference(ExternalThing::from_header(ptr).as_ref())
            }
        };
        Ok(term)
    }
}
