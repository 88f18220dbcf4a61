use core::ptr::{self, NonNull};

use crate::arch::{self, REF_NUMBERS};
use crate::offheap::{Node, OffHeapHeader};

use super::OpaqueTerm;

/// Words of an external thing that precede its data: `node` and `next`
pub const EXTERNAL_THING_HEAD: usize = 2;

/// Data words of an external pid: the process number and serial
pub const EXTERNAL_PID_DATA_WORDS: usize = 2;

/// Data words of an external port: the 64-bit port id
pub const EXTERNAL_PORT_DATA_WORDS: usize = 8 / arch::WORD_SIZE;

/// Data words of an external reference: its 32-bit numbers, packed
pub const EXTERNAL_REF_DATA_WORDS: usize = arch::to_word_size(REF_NUMBERS * 4);

/// A pid, port or reference belonging to another node.
///
/// External things hold a count on their `Node` and are linked into the
/// owner's off-heap list through `next`. The data words that follow depend
/// on which of the three kinds this is.
#[repr(C)]
pub struct ExternalThing {
    header: OpaqueTerm,
    node: *const Node,
    next: *mut OffHeapHeader,
    data: [usize],
}
impl ExternalThing {
    /// # Safety
    ///
    /// `ptr` must point to a live external header followed by its data.
    pub(crate) unsafe fn from_header(ptr: *mut OpaqueTerm) -> NonNull<Self> {
        let len = (*ptr).thing_arityval() - EXTERNAL_THING_HEAD;
        NonNull::new_unchecked(ptr::slice_from_raw_parts_mut(ptr as *mut usize, len) as *mut Self)
    }

    #[inline]
    pub fn header(&self) -> OpaqueTerm {
        self.header
    }

    #[inline]
    pub fn node_ptr(&self) -> *const Node {
        self.node
    }

    #[inline]
    pub fn node(&self) -> &Node {
        // A live external thing holds a count on its node
        unsafe { &*self.node }
    }

    #[inline]
    pub fn data(&self) -> &[usize] {
        &self.data
    }

    /// The process number and serial of an external pid
    pub fn pid(&self) -> Option<(usize, usize)> {
        if self.header.is_external_pid_header() {
            Some((self.data[0], self.data[1]))
        } else {
            None
        }
    }

    /// The id of an external port
    pub fn port_id(&self) -> Option<u64> {
        if !self.header.is_external_port_header() {
            return None;
        }
        let mut bytes = [0u8; 8];
        // Port ids are stored in native byte order across the data words
        unsafe {
            ptr::copy_nonoverlapping(self.data.as_ptr() as *const u8, bytes.as_mut_ptr(), 8);
        }
        Some(u64::from_ne_bytes(bytes))
    }

    /// The numbers of an external reference
    pub fn ref_numbers(&self) -> Option<[u32; REF_NUMBERS]> {
        if !self.header.is_external_ref_header() {
            return None;
        }
        let mut numbers = [0u32; REF_NUMBERS];
        unsafe {
            ptr::copy_nonoverlapping(
                self.data.as_ptr() as *const u32,
                numbers.as_mut_ptr(),
                REF_NUMBERS,
            );
        }
        Some(numbers)
    }
}
