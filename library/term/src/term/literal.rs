//! Marking literal data.
//!
//! Terms built into a literal area are shared by every process that loads
//! them and are never copied or collected. Once such an area is complete,
//! every boxed and list word in it (and the root term referring into it) gets
//! the literal bit set, so that a garbage collector can tell at a glance
//! that the pointee must be left alone.
//!
//! The pass walks the area word by word. Header words tell it how to treat
//! what follows: tuple elements are terms and are visited in place, while
//! the raw words of a thing are skipped. The one exception is a bit-string
//! view, whose last field is the boxed term it views and must be marked too.
use core::slice;

use log::trace;

use crate::arch;

use super::tag::PrimaryTag;
use super::OpaqueTerm;

/// Sets the literal bit on every boxed and list word in `region`, then on
/// `term` itself if it is a boxed or list word.
///
/// The exclusive borrow of the region stands for the requirement that the
/// area is freshly built and not yet visible to anyone else. Running the
/// pass again over a tagged area changes nothing. On targets without a
/// literal bit this does nothing.
pub fn tag_literals(term: &mut OpaqueTerm, region: &mut [OpaqueTerm]) {
    if !arch::HAS_LITERAL_TAG {
        return;
    }

    trace!(target: "term", "tagging literals in a region of {} words", region.len());

    let mut tagged = 0;
    for_each_pointer_slot(region, |_, word| {
        *word = word.with_literal_tag();
        tagged += 1;
    });

    if term.is_boxed() || term.is_list() {
        *term = term.with_literal_tag();
    }

    trace!(target: "term", "tagged {} literal pointers", tagged);
}

/// Same as `tag_literals`, for callers holding a raw region.
///
/// # Safety
///
/// `start..start + len` must be a live, initialized region of term words
/// that nothing else is reading or writing, and `term` must be valid for
/// reads and writes.
pub unsafe fn tag_literals_raw(term: *mut OpaqueTerm, start: *mut OpaqueTerm, len: usize) {
    let region = slice::from_raw_parts_mut(start, len);
    tag_literals(&mut *term, region)
}

/// Calls `visit` with the index and contents of every boxed or list word in
/// `region` which holds a term, skipping the raw payload of things.
pub(crate) fn for_each_pointer_slot<F>(region: &mut [OpaqueTerm], mut visit: F)
where
    F: FnMut(usize, &mut OpaqueTerm),
{
    let len = region.len();
    let mut index = 0;
    while index < len {
        let word = region[index];
        match word.primary_tag() {
            PrimaryTag::Boxed | PrimaryTag::List => visit(index, &mut region[index]),
            PrimaryTag::Header if word.is_sub_bits_header() => {
                // Stop short of `orig`, the last field, so it is visited next
                index += word.thing_arityval().saturating_sub(1);
            }
            PrimaryTag::Header if word.is_thing() => {
                index += word.thing_arityval();
            }
            // Tuple elements are terms and are visited in place
            PrimaryTag::Header | PrimaryTag::Immediate => (),
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::heap::{HeapFragment, TermAlloc};
    use crate::term::{Header, Subtag};

    use super::*;

    fn boxed_at(region: &[OpaqueTerm], index: usize) -> OpaqueTerm {
        OpaqueTerm::make_boxed(&region[index])
    }

    #[test]
    fn things_are_skipped_and_tuple_elements_visited() {
        let mut region = vec![OpaqueTerm::NIL; 8];
        // A heap bit string whose data word happens to look like a box
        region[0] = Header::new(Subtag::HeapBits, 2).into();
        region[1] = OpaqueTerm::from_raw(64);
        region[2] = OpaqueTerm::from_raw(0x1002);
        // A 2-tuple of a small and a box
        region[3] = Header::arityval(2).into();
        region[4] = OpaqueTerm::small(1);
        region[5] = boxed_at(&region, 0);
        region[6] = OpaqueTerm::atom(3);
        region[7] = boxed_at(&region, 3);

        let mut visited = Vec::new();
        for_each_pointer_slot(&mut region, |index, _| visited.push(index));
        assert_eq!(visited, vec![5, 7]);
    }

    #[test]
    fn sub_bits_orig_is_visited_once() {
        let mut region = vec![OpaqueTerm::NIL; 9];
        region[0] = Header::new(Subtag::HeapBits, 1).into();
        region[1] = OpaqueTerm::from_raw(0);
        region[2] = Header::new(Subtag::SubBits, 4).into();
        region[3] = OpaqueTerm::from_raw(0);
        region[4] = OpaqueTerm::from_raw(0);
        region[5] = OpaqueTerm::from_raw(0);
        region[6] = boxed_at(&region, 0);
        // Sentinel thing whose payload looks like a box
        region[7] = Header::new(Subtag::Float, 1).into();
        region[8] = OpaqueTerm::from_raw(0x2002);

        let mut visited = Vec::new();
        for_each_pointer_slot(&mut region, |index, _| visited.push(index));
        assert_eq!(visited, vec![6]);
    }

    #[test]
    fn tagging_is_idempotent() {
        let mut heap = HeapFragment::new(32).unwrap();
        let list = heap
            .list_from_slice(&[OpaqueTerm::small(1), OpaqueTerm::small(2)])
            .unwrap();
        let float = heap.float(1.5).unwrap();
        let mut root = heap.tuple_from_slice(&[list, float]).unwrap();

        tag_literals(&mut root, heap.used_mut());
        let once = heap.used().to_vec();
        let root_once = root;

        tag_literals(&mut root, heap.used_mut());
        assert_eq!(heap.used(), once.as_slice());
        assert_eq!(root, root_once);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn tagged_pointers_still_resolve() {
        let mut heap = HeapFragment::new(32).unwrap();
        let list = heap
            .list_from_slice(&[OpaqueTerm::small(1), OpaqueTerm::small(2)])
            .unwrap();
        let mut root = heap
            .tuple_from_slice(&[list, OpaqueTerm::atom(4)])
            .unwrap();
        let untagged = root.boxed_val();

        tag_literals(&mut root, heap.used_mut());

        assert!(root.is_literal());
        assert_eq!(root.boxed_val(), untagged);
        let tuple = unsafe { root.tuple_val().as_ref() };
        assert!(tuple[0].is_literal());
        let heads: Vec<isize> = unsafe { (*tuple[0].list_val()).iter() }
            .map(|head| head.signed_val())
            .collect();
        assert_eq!(heads, vec![1, 2]);
        assert_eq!(tuple[1], OpaqueTerm::atom(4));
    }

    #[cfg(not(target_pointer_width = "64"))]
    #[test]
    fn tagging_is_disabled_without_literal_bit() {
        let mut heap = HeapFragment::new(8).unwrap();
        let mut root = heap.cons(OpaqueTerm::NIL, OpaqueTerm::NIL).unwrap();
        let before = heap.used().to_vec();
        tag_literals(&mut root, heap.used_mut());
        assert_eq!(heap.used(), before.as_slice());
        assert!(!root.is_literal());
    }
}
