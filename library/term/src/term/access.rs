//! Pointer construction and the narrowing accessors for boxed terms.
//!
//! The `*_val` accessors turn a term word into a pointer to the layout its
//! tags promise. Each states what it expects with `precondition!`, so a word
//! of the wrong kind is caught at the call site in checked builds. Accessors
//! that have to look at the pointee to check their precondition are `unsafe`:
//! the caller guarantees the box points to live heap data.
use core::ptr::NonNull;

use crate::error::TermEncodingError;
use crate::offheap::Node;

use super::tag::{is_taggable_pointer, PTR_MASK, TAG_PRIMARY_BOXED, TAG_PRIMARY_LIST};
use super::*;

impl OpaqueTerm {
    /// Tags a pointer to a header word as a boxed term
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn make_boxed(ptr: *const OpaqueTerm) -> Self {
        precondition!(is_taggable_pointer(ptr as usize));
        Self::from_raw(ptr as usize | TAG_PRIMARY_BOXED)
    }

    /// Tags a pointer to a cons cell as a list term
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn make_list(ptr: *const Cons) -> Self {
        precondition!(is_taggable_pointer(ptr as usize));
        Self::from_raw(ptr as usize | TAG_PRIMARY_LIST)
    }

    /// Tags a pointer to a header word as a boxed term, failing if the
    /// pointer is null or not aligned enough to carry tag bits
    pub fn try_make_boxed(ptr: *const OpaqueTerm) -> Result<Self, TermEncodingError> {
        if is_taggable_pointer(ptr as usize) {
            Ok(Self::make_boxed(ptr))
        } else {
            Err(TermEncodingError::InvalidAlignment)
        }
    }

    /// Tags a pointer to a cons cell as a list term, failing if the pointer
    /// is null or not aligned enough to carry tag bits
    pub fn try_make_list(ptr: *const Cons) -> Result<Self, TermEncodingError> {
        if is_taggable_pointer(ptr as usize) {
            Ok(Self::make_list(ptr))
        } else {
            Err(TermEncodingError::InvalidAlignment)
        }
    }

    /// Returns the address of the header this box points to, stripping the
    /// literal bit
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn boxed_val(self) -> *mut OpaqueTerm {
        precondition!(self.is_boxed());
        (self.raw() & PTR_MASK) as *mut OpaqueTerm
    }

    /// Returns the address of the cons cell this list points to, stripping
    /// the literal bit
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub fn list_val(self) -> *mut Cons {
        precondition!(self.is_list());
        (self.raw() & PTR_MASK) as *mut Cons
    }

    /// Reads the header word a box points to
    ///
    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn boxed_header(self) -> OpaqueTerm {
        *self.boxed_val()
    }

    /// Returns true if this is a box around an internal reference backed by
    /// a magic binary
    ///
    /// # Safety
    ///
    /// Same as `boxed_header`, for boxed words.
    pub unsafe fn is_magic_ref(self) -> bool {
        self.is_internal_ref() && RefThing::from_header(self.boxed_val()).as_ref().is_magic()
    }

    /// Returns true if this is a box around an internal reference made of
    /// plain numbers
    ///
    /// # Safety
    ///
    /// Same as `boxed_header`, for boxed words.
    pub unsafe fn is_ordinary_ref(self) -> bool {
        self.is_internal_ref() && !RefThing::from_header(self.boxed_val()).as_ref().is_magic()
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn tuple_val(self) -> NonNull<Tuple> {
        precondition!(self.is_tuple());
        Tuple::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn big_val(self) -> NonNull<BigInt> {
        precondition!(self.is_big());
        BigInt::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn float_val(self) -> NonNull<Float> {
        precondition!(self.is_float());
        Float::from_header(self.boxed_val())
    }

    /// Returns the header address of a heap or sub bit string
    ///
    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn bitstring_val(self) -> NonNull<OpaqueTerm> {
        precondition!(self.is_bitstring());
        NonNull::new_unchecked(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn heap_bits_val(self) -> NonNull<HeapBits> {
        precondition!(self.is_heap_bits());
        HeapBits::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn sub_bits_val(self) -> NonNull<SubBits> {
        precondition!(self.is_sub_bits());
        SubBits::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn bin_ref_val(self) -> NonNull<BinRef> {
        precondition!(self.is_bin_ref());
        BinRef::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn fun_val(self) -> NonNull<Closure> {
        precondition!(self.is_fun());
        Closure::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn map_val(self) -> NonNull<FlatMap> {
        precondition!(self.is_map());
        FlatMap::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn internal_ref_val(self) -> NonNull<RefThing> {
        precondition!(self.is_internal_ref());
        RefThing::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn internal_magic_ref(self) -> NonNull<MagicRef> {
        precondition!(self.is_magic_ref());
        MagicRef::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn internal_ordinary_ref(self) -> NonNull<OrdinaryRef> {
        precondition!(self.is_ordinary_ref());
        OrdinaryRef::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_val(self) -> NonNull<ExternalThing> {
        precondition!(self.is_external());
        ExternalThing::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_pid_val(self) -> NonNull<ExternalThing> {
        precondition!(self.is_external_pid());
        ExternalThing::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_port_val(self) -> NonNull<ExternalThing> {
        precondition!(self.is_external_port());
        ExternalThing::from_header(self.boxed_val())
    }

    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_ref_val(self) -> NonNull<ExternalThing> {
        precondition!(self.is_external_ref());
        ExternalThing::from_header(self.boxed_val())
    }

    /// Returns the node an external pid, port or reference belongs to
    ///
    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_node(self) -> *const Node {
        self.external_val().as_ref().node_ptr()
    }

    /// Returns the number of data words of an external thing
    ///
    /// # Safety
    ///
    /// The box must point to live heap data.
    #[inline]
    #[cfg_attr(any(debug_assertions, feature = "checked"), track_caller)]
    pub unsafe fn external_data_words(self) -> usize {
        self.external_val().as_ref().data().len()
    }
}

/// Generates `is_<kind>` predicates for boxed terms, which test the primary
/// tag and then the header word behind the box
macro_rules! boxed_predicates {
    ($($kind:ident => $header_pred:ident),* $(,)?) => {
        paste::paste! {
            impl OpaqueTerm {
                $(
                    #[doc = "Returns true if this is a box around a `" $kind "` header"]
                    ///
                    /// # Safety
                    ///
                    /// For boxed words, the box must point to live heap data.
                    #[inline]
                    pub unsafe fn [<is_ $kind>](self) -> bool {
                        self.is_boxed() && (*self.boxed_val()).$header_pred()
                    }
                )*
            }
        }
    };
}

boxed_predicates! {
    tuple => is_arity_value,
    big => is_big_header,
    float => is_float_header,
    bitstring => is_bitstring_header,
    heap_bits => is_heap_bits_header,
    sub_bits => is_sub_bits_header,
    bin_ref => is_bin_ref_header,
    fun => is_fun_header,
    map => is_map_header,
    internal_ref => is_ref_header,
    external => is_external_header,
    external_pid => is_external_pid_header,
    external_port => is_external_port_header,
    external_ref => is_external_ref_header,
}
