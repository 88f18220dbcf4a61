use core::ptr::{self, NonNull};
use std::sync::Arc;

use crate::arch::{self, FLOAT_WORDS, REF_NUMBERS};
use crate::error::{HeapError, TermEncodingError};
use crate::offheap::{MagicBinary, Node, OffHeap, OffHeapBinary, OffHeapHeader};
use crate::term::*;

/// A region terms can be built into.
///
/// Implementors only provide raw word allocation and their off-heap list;
/// the builders write each kind of term in its in-memory layout and return
/// the term word referring to it. Builders never partially write a term: all
/// the words a term needs are allocated before any of them is written.
pub trait TermAlloc {
    /// Allocates `words` contiguous, word-aligned term words
    fn alloc_words(&mut self, words: usize) -> Result<NonNull<OpaqueTerm>, HeapError>;

    /// The list tracking things built here which hold off-heap counts
    fn off_heap_mut(&mut self) -> &mut OffHeap;

    fn cons(&mut self, head: OpaqueTerm, tail: OpaqueTerm) -> Result<OpaqueTerm, HeapError> {
        let cell = self.alloc_words(2)?.cast::<Cons>().as_ptr();
        unsafe {
            cell.write(Cons::new(head, tail));
        }
        Ok(OpaqueTerm::make_list(cell))
    }

    /// Builds a proper list of `elements`, with all cells laid out contiguously
    fn list_from_slice(&mut self, elements: &[OpaqueTerm]) -> Result<OpaqueTerm, HeapError> {
        let len = elements.len();
        if len == 0 {
            return Ok(OpaqueTerm::NIL);
        }
        let cells = self.alloc_words(2 * len)?.cast::<Cons>().as_ptr();
        for (index, head) in elements.iter().copied().enumerate() {
            unsafe {
                let tail = if index + 1 < len {
                    OpaqueTerm::make_list(cells.add(index + 1))
                } else {
                    OpaqueTerm::NIL
                };
                cells.add(index).write(Cons::new(head, tail));
            }
        }
        Ok(OpaqueTerm::make_list(cells))
    }

    fn tuple_from_slice(&mut self, elements: &[OpaqueTerm]) -> Result<OpaqueTerm, HeapError> {
        let len = elements.len();
        let ptr = self.alloc_words(1 + len)?.as_ptr();
        unsafe {
            ptr.write(Header::arityval(len).into());
            ptr::copy_nonoverlapping(elements.as_ptr(), ptr.add(1), len);
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    fn float(&mut self, value: f64) -> Result<OpaqueTerm, HeapError> {
        let ptr = self.alloc_words(1 + FLOAT_WORDS)?.as_ptr();
        unsafe {
            (ptr as *mut Float).write(Float::new(value));
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a bignum from its magnitude, least significant digit first
    fn bignum(&mut self, negative: bool, digits: &[usize]) -> Result<OpaqueTerm, HeapError> {
        let len = digits.len();
        if len == 0 {
            return Err(TermEncodingError::ValueOutOfRange.into());
        }
        let subtag = if negative {
            Subtag::NegBig
        } else {
            Subtag::PosBig
        };
        let ptr = self.alloc_words(1 + len)?.as_ptr();
        unsafe {
            ptr.write(Header::new(subtag, len).into());
            ptr::copy_nonoverlapping(digits.as_ptr(), ptr.add(1) as *mut usize, len);
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a bit string holding `bytes` inline
    fn heap_bits(&mut self, bytes: &[u8]) -> Result<OpaqueTerm, HeapError> {
        let bit_size = bytes
            .len()
            .checked_mul(8)
            .ok_or(TermEncodingError::ValueOutOfRange)?;
        let data_words = arch::to_word_size(bytes.len());
        let ptr = self.alloc_words(2 + data_words)?.as_ptr();
        unsafe {
            ptr.write(Header::new(Subtag::HeapBits, 1 + data_words).into());
            ptr.add(1).write(OpaqueTerm::from_raw(bit_size));
            let data = ptr.add(2);
            for index in 0..data_words {
                data.add(index).write(OpaqueTerm::from_raw(0));
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), data as *mut u8, bytes.len());
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a view of the bits `start..end` of `orig`, which must be a
    /// heap bit string or a bin-ref
    ///
    /// # Safety
    ///
    /// `orig` must be live.
    unsafe fn sub_bits(
        &mut self,
        orig: OpaqueTerm,
        start: usize,
        end: usize,
        flags: BitsFlags,
    ) -> Result<OpaqueTerm, HeapError> {
        let size = if orig.is_heap_bits() {
            orig.heap_bits_val().as_ref().bit_size()
        } else if orig.is_bin_ref() {
            orig.bin_ref_val().as_ref().as_bytes().len() * 8
        } else {
            return Err(TermEncodingError::InvalidKind.into());
        };
        if start > end || end > size {
            return Err(TermEncodingError::ValueOutOfRange.into());
        }
        let ptr = self.alloc_words(1 + SUB_BITS_ARITY)?.as_ptr();
        let header = Header::new(Subtag::SubBits, SUB_BITS_ARITY).into();
        (ptr as *mut SubBits).write(SubBits::new(header, flags, start, end, orig));
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a flat map whose keys tuple and values are laid out in the
    /// order of `entries`
    fn flat_map(&mut self, entries: &[(OpaqueTerm, OpaqueTerm)]) -> Result<OpaqueTerm, HeapError> {
        let len = entries.len();
        let keys = self.alloc_words((1 + len) + (2 + FLAT_MAP_ARITY + len))?.as_ptr();
        unsafe {
            keys.write(Header::arityval(len).into());
            let map = keys.add(1 + len);
            map.write(Header::new(Subtag::Map, FLAT_MAP_ARITY).into());
            map.add(1).write(OpaqueTerm::from_raw(len));
            map.add(2).write(OpaqueTerm::make_boxed(keys));
            for (index, (key, value)) in entries.iter().copied().enumerate() {
                keys.add(1 + index).write(key);
                map.add(3 + index).write(value);
            }
            Ok(OpaqueTerm::make_boxed(map))
        }
    }

    /// Builds a closure calling the function at `index`, capturing `env`
    fn closure(
        &mut self,
        index: usize,
        arity: usize,
        env: &[OpaqueTerm],
    ) -> Result<OpaqueTerm, HeapError> {
        if arity > MAX_CLOSURE_ARITY {
            return Err(TermEncodingError::ValueOutOfRange.into());
        }
        let len = env.len();
        let ptr = self.alloc_words(1 + CLOSURE_ARITY + len)?.as_ptr();
        unsafe {
            ptr.write(Header::new(Subtag::Fun, CLOSURE_ARITY).into());
            ptr.add(1).write(OpaqueTerm::from_raw(index));
            ptr.add(2).write(OpaqueTerm::from_raw(Closure::pack_info(arity, len)));
            ptr::copy_nonoverlapping(env.as_ptr(), ptr.add(3), len);
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    fn ordinary_ref(&mut self, numbers: [u32; REF_NUMBERS]) -> Result<OpaqueTerm, HeapError> {
        let ptr = self.alloc_words(1 + arch::ORDINARY_REF_ARITY)?.as_ptr();
        unsafe {
            (ptr as *mut OrdinaryRef).write(OrdinaryRef::new(numbers));
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a reference backed by `binary`, taking a count on it
    fn magic_ref(&mut self, binary: &Arc<MagicBinary>) -> Result<OpaqueTerm, HeapError> {
        let ptr = self.alloc_words(1 + arch::MAGIC_REF_ARITY)?.as_ptr();
        let binary = Arc::into_raw(Arc::clone(binary));
        unsafe {
            (ptr as *mut MagicRef).write(MagicRef::new(binary, ptr::null_mut()));
            self.off_heap_mut()
                .push(NonNull::new_unchecked(ptr as *mut OffHeapHeader));
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    /// Builds a reference to the off-heap `binary`, taking a count on it
    fn bin_ref(&mut self, binary: &Arc<OffHeapBinary>) -> Result<OpaqueTerm, HeapError> {
        let ptr = self.alloc_words(1 + BIN_REF_ARITY)?.as_ptr();
        let binary = Arc::into_raw(Arc::clone(binary));
        unsafe {
            let header = Header::new(Subtag::BinRef, BIN_REF_ARITY).into();
            (ptr as *mut BinRef).write(BinRef::new(header, binary));
            self.off_heap_mut()
                .push(NonNull::new_unchecked(ptr as *mut OffHeapHeader));
        }
        Ok(OpaqueTerm::make_boxed(ptr))
    }

    fn external_pid(
        &mut self,
        node: &Arc<Node>,
        number: usize,
        serial: usize,
    ) -> Result<OpaqueTerm, HeapError> {
        build_external(self, node, Subtag::ExternalPid, &[number, serial])
    }

    fn external_port(&mut self, node: &Arc<Node>, id: u64) -> Result<OpaqueTerm, HeapError> {
        let mut data = [0usize; EXTERNAL_PORT_DATA_WORDS];
        let bytes = id.to_ne_bytes();
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), data.as_mut_ptr() as *mut u8, bytes.len());
        }
        build_external(self, node, Subtag::ExternalPort, &data)
    }

    fn external_ref(
        &mut self,
        node: &Arc<Node>,
        numbers: [u32; REF_NUMBERS],
    ) -> Result<OpaqueTerm, HeapError> {
        let mut data = [0usize; EXTERNAL_REF_DATA_WORDS];
        unsafe {
            ptr::copy_nonoverlapping(numbers.as_ptr(), data.as_mut_ptr() as *mut u32, REF_NUMBERS);
        }
        build_external(self, node, Subtag::ExternalRef, &data)
    }
}

fn build_external<A>(
    heap: &mut A,
    node: &Arc<Node>,
    subtag: Subtag,
    data: &[usize],
) -> Result<OpaqueTerm, HeapError>
where
    A: TermAlloc + ?Sized,
{
    let arity = EXTERNAL_THING_HEAD + data.len();
    let ptr = heap.alloc_words(1 + arity)?.as_ptr();
    let node = Arc::into_raw(Arc::clone(node));
    unsafe {
        ptr.write(Header::new(subtag, arity).into());
        (ptr.add(1) as *mut *const Node).write(node);
        (ptr.add(2) as *mut *mut OffHeapHeader).write(ptr::null_mut());
        ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(3) as *mut usize, data.len());
        heap.off_heap_mut()
            .push(NonNull::new_unchecked(ptr as *mut OffHeapHeader));
    }
    Ok(OpaqueTerm::make_boxed(ptr))
}
