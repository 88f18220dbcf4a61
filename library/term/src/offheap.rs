//! Objects living outside of any heap, and the lists that track them.
//!
//! Large binaries, magic binaries backing resource references, and the
//! nodes of external pids/ports/references are shared between heaps and
//! reference counted. Each heap thing pointing at one holds a strong count
//! obtained from `Arc::into_raw`, and is linked into the owning heap's
//! `OffHeap` list through its `next` field so that the count can be given
//! back when the heap goes away.
use core::fmt;
use core::ptr::{self, NonNull};
use std::sync::Arc;

use log::trace;

use crate::term::{OpaqueTerm, Subtag};

/// A remote node, as referenced by external pids, ports and references
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Node {
    name: usize,
    creation: u32,
}
impl Node {
    /// Creates a node named by the atom with index `name`
    pub fn new(name: usize, creation: u32) -> Arc<Self> {
        Arc::new(Self { name, creation })
    }

    /// The atom index of the node name
    #[inline]
    pub fn name(&self) -> usize {
        self.name
    }

    #[inline]
    pub fn creation(&self) -> u32 {
        self.creation
    }
}

/// Runs when the last reference to a magic binary is released
pub type Destructor = fn(&MagicBinary);

/// A native resource backing magic references
pub struct MagicBinary {
    data: usize,
    destructor: Option<Destructor>,
}
impl MagicBinary {
    pub fn new(data: usize, destructor: Option<Destructor>) -> Arc<Self> {
        Arc::new(Self { data, destructor })
    }

    /// The word of native data this binary wraps
    #[inline]
    pub fn data(&self) -> usize {
        self.data
    }
}
impl Drop for MagicBinary {
    fn drop(&mut self) {
        if let Some(destructor) = self.destructor {
            trace!(target: "term", "running destructor of magic binary {:#x}", self.data);
            destructor(self);
        }
    }
}
impl fmt::Debug for MagicBinary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MagicBinary")
            .field("data", &self.data)
            .field("has_destructor", &self.destructor.is_some())
            .finish()
    }
}

/// A binary too large to live on a process heap
#[derive(Debug, PartialEq, Eq)]
pub struct OffHeapBinary {
    bytes: Box<[u8]>,
}
impl OffHeapBinary {
    pub fn new(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            bytes: bytes.into(),
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The common prefix of every thing linked into an off-heap list.
///
/// Bin-refs, magic references and external things all keep their off-heap
/// object in the word after the header and the `next` link in the word
/// after that.
#[repr(C)]
pub struct OffHeapHeader {
    thing_word: OpaqueTerm,
    object: *const (),
    next: *mut OffHeapHeader,
}
impl OffHeapHeader {
    #[inline]
    pub fn thing_word(&self) -> OpaqueTerm {
        self.thing_word
    }
}

/// The list of heap things holding counts on off-heap objects
pub struct OffHeap {
    first: *mut OffHeapHeader,
    len: usize,
}
impl Default for OffHeap {
    fn default() -> Self {
        Self::new()
    }
}
impl OffHeap {
    pub const fn new() -> Self {
        Self {
            first: ptr::null_mut(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_null()
    }

    /// Links `thing` at the front of this list
    ///
    /// # Safety
    ///
    /// `thing` must be a live bin-ref, magic reference or external thing
    /// that outlives its membership in this list and holds one count on its
    /// off-heap object.
    pub unsafe fn push(&mut self, thing: NonNull<OffHeapHeader>) {
        (*thing.as_ptr()).next = self.first;
        self.first = thing.as_ptr();
        self.len += 1;
    }

    /// Visits every linked thing, most recent first
    ///
    /// # Safety
    ///
    /// Every linked thing must still be live.
    pub unsafe fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.first,
            _list: self,
        }
    }

    /// Gives back the count every linked thing holds on its off-heap object,
    /// freeing objects whose last count this was, and empties the list.
    ///
    /// # Safety
    ///
    /// Every linked thing must still be live, and none of them may be used
    /// to reach its off-heap object afterwards.
    pub unsafe fn release(&mut self) {
        let mut released = 0;
        let mut current = self.first;
        while let Some(thing) = current.as_ref() {
            current = thing.next;
            let header = thing.thing_word;
            match header.thing_subtag() {
                Subtag::BinRef => drop(Arc::from_raw(thing.object as *const OffHeapBinary)),
                Subtag::Ref => drop(Arc::from_raw(thing.object as *const MagicBinary)),
                Subtag::ExternalPid | Subtag::ExternalPort | Subtag::ExternalRef => {
                    drop(Arc::from_raw(thing.object as *const Node))
                }
                subtag => {
                    trace!(target: "term", "skipping {:?} thing in off-heap list", subtag);
                    continue;
                }
            }
            released += 1;
        }
        trace!(target: "term", "released {} off-heap objects", released);
        self.first = ptr::null_mut();
        self.len = 0;
    }
}
impl fmt::Debug for OffHeap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OffHeap").field("len", &self.len).finish()
    }
}

pub struct Iter<'a> {
    next: *mut OffHeapHeader,
    _list: &'a OffHeap,
}
impl<'a> Iterator for Iter<'a> {
    type Item = &'a OffHeapHeader;

    fn next(&mut self) -> Option<Self::Item> {
        // Liveness was promised when the iterator was created
        let thing = unsafe { self.next.as_ref()? };
        self.next = thing.next;
        Some(thing)
    }
}
