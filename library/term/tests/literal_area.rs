use std::sync::Arc;

use pretty_assertions::assert_eq;

use firefly_term::arch::HAS_LITERAL_TAG;
use firefly_term::term::BitsFlags;
use firefly_term::{
    HeapError, HeapFragment, LiteralArea, Node, OpaqueTerm, PrimaryTag, TermAlloc, TypedTerm,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn is_pointer(term: &OpaqueTerm) -> bool {
    matches!(term.primary_tag(), PrimaryTag::Boxed | PrimaryTag::List)
}

#[test]
fn sealing_tags_only_the_literal_area() {
    init_logging();
    let mut area = LiteralArea::new(64).unwrap();
    let list = area
        .list_from_slice(&[OpaqueTerm::small(1), OpaqueTerm::atom(2)])
        .unwrap();
    let float = area.float(0.5).unwrap();
    let inner = area.tuple_from_slice(&[float, OpaqueTerm::NIL]).unwrap();
    let mut root = area.tuple_from_slice(&[list, inner]).unwrap();

    let mut heap = HeapFragment::new(16).unwrap();
    let private_list = heap.cons(OpaqueTerm::small(3), OpaqueTerm::NIL).unwrap();
    let private = heap.tuple_from_slice(&[private_list, root]).unwrap();
    let private_before = heap.used().to_vec();

    area.seal(&mut root).unwrap();
    assert!(area.is_sealed());

    assert_eq!(root.is_literal(), HAS_LITERAL_TAG);
    let pointers: Vec<OpaqueTerm> = area.used().iter().copied().filter(is_pointer).collect();
    assert!(!pointers.is_empty());
    for word in pointers {
        assert_eq!(word.is_literal(), HAS_LITERAL_TAG, "{:?}", word);
        let target = match word.primary_tag() {
            PrimaryTag::Boxed => word.boxed_val() as *const u8,
            _ => word.list_val() as *const u8,
        };
        assert!(area.contains(target));
    }

    // Nothing outside the area is touched, including copies of the root
    assert_eq!(heap.used(), private_before.as_slice());
    assert!(!private.is_literal());

    // Literal pointers still lead to the same data
    match unsafe { root.decode() }.unwrap() {
        TypedTerm::Tuple(tuple) => {
            assert_eq!(tuple.len(), 2);
            assert_eq!(unsafe { (*tuple[0].list_val()).head }, OpaqueTerm::small(1));
            let inner = unsafe { tuple[1].tuple_val().as_ref() };
            let float = unsafe { inner[0].float_val().as_ref() };
            assert_eq!(float.value(), 0.5);
        }
        other => panic!("expected tuple, got {:?}", other),
    }
}

#[test]
fn sealing_refuses_pointers_leaving_the_area() {
    init_logging();
    let mut heap = HeapFragment::new(8).unwrap();
    let private = heap.cons(OpaqueTerm::small(3), OpaqueTerm::NIL).unwrap();

    let mut area = LiteralArea::new(16).unwrap();
    let shared = area.cons(OpaqueTerm::small(1), OpaqueTerm::NIL).unwrap();
    let mut root = area.tuple_from_slice(&[shared, private]).unwrap();
    let before = area.used().to_vec();

    assert_eq!(area.seal(&mut root), Err(HeapError::ForeignPointer(private.raw())));
    assert!(!area.is_sealed());
    assert!(!root.is_literal());
    assert_eq!(area.used(), before.as_slice());
    let tuple = unsafe { root.tuple_val().as_ref() };
    assert!(!tuple[1].is_literal());
    assert!(!area.contains(tuple[1].list_val()));

    // A root outside the area is refused the same way
    let mut outside = private;
    let mut other = LiteralArea::new(4).unwrap();
    other.cons(OpaqueTerm::NIL, OpaqueTerm::NIL).unwrap();
    assert_eq!(other.seal(&mut outside), Err(HeapError::ForeignPointer(private.raw())));
    assert_eq!(outside, private);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn sealed_literals_may_be_shared_between_areas() {
    let mut first = LiteralArea::new(8).unwrap();
    let mut shared = first.cons(OpaqueTerm::small(1), OpaqueTerm::NIL).unwrap();
    first.seal(&mut shared).unwrap();
    assert!(shared.is_literal());

    let mut second = LiteralArea::new(8).unwrap();
    let mut root = second.tuple_from_slice(&[shared]).unwrap();
    second.seal(&mut root).unwrap();
    assert!(root.is_literal());
    let tuple = unsafe { root.tuple_val().as_ref() };
    assert_eq!(tuple[0], shared);
}

#[test]
fn sealed_area_rejects_allocation() {
    let mut area = LiteralArea::new(8).unwrap();
    let mut root = area.tuple_from_slice(&[OpaqueTerm::small(1)]).unwrap();
    area.seal(&mut root).unwrap();
    assert_eq!(area.alloc_words(1), Err(HeapError::Sealed));
    assert_eq!(area.float(1.0), Err(HeapError::Sealed));

    let used = area.used().to_vec();
    area.seal(&mut root).unwrap();
    assert_eq!(area.used(), used.as_slice());
}

#[test]
fn view_orig_is_tagged_without_overrunning() {
    let mut area = LiteralArea::new(32).unwrap();
    let bits = area.heap_bits(&[0xAA; 9]).unwrap();
    let mut root = unsafe { area.sub_bits(bits, 0, 72, BitsFlags::empty()) }.unwrap();
    // A thing following the view; its payload must stay untouched
    let sentinel = area.float(f64::from_bits(0x4000_0000_0000_0002)).unwrap();
    let sentinel_payload = unsafe { sentinel.float_val().as_ref() }.value().to_bits();

    area.seal(&mut root).unwrap();

    let view = unsafe { root.sub_bits_val().as_ref() };
    assert_eq!(view.orig().is_literal(), HAS_LITERAL_TAG);
    assert_eq!(view.orig().boxed_val(), bits.boxed_val());
    assert_eq!(view.bit_size(), 72);
    assert_eq!(
        unsafe { sentinel.float_val().as_ref() }.value().to_bits(),
        sentinel_payload
    );
}

#[test]
fn map_values_and_closure_environment_are_tagged() {
    let mut area = LiteralArea::new(64).unwrap();
    let value = area.tuple_from_slice(&[OpaqueTerm::small(1)]).unwrap();
    let map = area.flat_map(&[(OpaqueTerm::atom(1), value)]).unwrap();
    let captured = area.cons(OpaqueTerm::small(2), OpaqueTerm::NIL).unwrap();
    let closure = area.closure(0, 0, &[captured, map]).unwrap();
    let mut root = area.list_from_slice(&[closure]).unwrap();

    area.seal(&mut root).unwrap();

    let closure = unsafe { (*root.list_val()).head };
    assert_eq!(closure.is_literal(), HAS_LITERAL_TAG);
    let env = unsafe { closure.fun_val().as_ref() }.env();
    assert_eq!(env[0].is_literal(), HAS_LITERAL_TAG);
    assert_eq!(env[1].is_literal(), HAS_LITERAL_TAG);

    let map = unsafe { env[1].map_val().as_ref() };
    assert_eq!(map.keys_term().is_literal(), HAS_LITERAL_TAG);
    assert_eq!(map.values()[0].is_literal(), HAS_LITERAL_TAG);
    assert_eq!(map.len(), 1);
}

#[test]
fn literal_area_releases_off_heap_objects() {
    let node = Node::new(1, 1);
    let mut area = LiteralArea::new(16).unwrap();
    let mut root = area.external_pid(&node, 1, 0).unwrap();
    area.seal(&mut root).unwrap();
    assert_eq!(Arc::strong_count(&node), 2);
    drop(area);
    assert_eq!(Arc::strong_count(&node), 1);
}
