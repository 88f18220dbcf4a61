#[macro_use]
pub(crate) mod precondition;

mod access;
mod bits;
mod closure;
mod external;
mod float;
mod header;
mod integer;
mod list;
mod literal;
mod map;
mod opaque;
mod reference;
mod tag;
mod tuple;
mod typed;

pub use self::bits::{BinRef, BitsFlags, HeapBits, SubBits, BIN_REF_ARITY, SUB_BITS_ARITY};
pub use self::closure::{Closure, CLOSURE_ARITY, MAX_CLOSURE_ARITY};
pub use self::external::{
    ExternalThing, EXTERNAL_PID_DATA_WORDS, EXTERNAL_PORT_DATA_WORDS, EXTERNAL_REF_DATA_WORDS,
    EXTERNAL_THING_HEAD,
};
pub use self::float::Float;
pub use self::header::*;
pub use self::integer::BigInt;
pub use self::list::{Cons, Iter as ListIter};
pub use self::literal::{tag_literals, tag_literals_raw};
pub use self::map::{FlatMap, FLAT_MAP_ARITY};
pub use self::opaque::OpaqueTerm;
pub use self::reference::{marker_offset, MagicRef, OrdinaryRef, RefThing, ORDINARY_REF_MARKER};
pub use self::tag::{
    is_taggable_pointer, PrimaryTag, MAX_ATOM_INDEX, MAX_CATCH_INDEX, MAX_PID_NUMBER,
    MAX_PORT_NUMBER, MAX_SMALL, MIN_SMALL,
};
pub use self::tuple::Tuple;
pub use self::typed::TypedTerm;

pub(crate) use self::literal::for_each_pointer_slot;
pub(crate) use self::reference::probe_magic_layout;
