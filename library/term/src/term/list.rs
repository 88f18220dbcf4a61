use super::OpaqueTerm;

/// A cons cell, the target of every list word.
///
/// Cons cells have no header; the list tag on the pointer is what identifies
/// them. A proper list ends in a cell whose tail is `NIL`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct Cons {
    pub head: OpaqueTerm,
    pub tail: OpaqueTerm,
}
impl Cons {
    #[inline]
    pub const fn new(head: OpaqueTerm, tail: OpaqueTerm) -> Self {
        Self { head, tail }
    }

    /// Iterates the heads of this list, stopping at the first tail which is
    /// not a cons cell.
    ///
    /// # Safety
    ///
    /// Every cell reachable through the tails must be live.
    pub unsafe fn iter(&self) -> Iter<'_> {
        Iter { cell: Some(self) }
    }

    /// Returns the tail of the last cell, which is `NIL` for a proper list
    ///
    /// # Safety
    ///
    /// Every cell reachable through the tails must be live.
    pub unsafe fn last_tail(&self) -> OpaqueTerm {
        let mut cell = self;
        while cell.tail.is_list() {
            cell = &*cell.tail.list_val();
        }
        cell.tail
    }
}

pub struct Iter<'a> {
    cell: Option<&'a Cons>,
}
impl<'a> Iterator for Iter<'a> {
    type Item = OpaqueTerm;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cell.take()?;
        if cell.tail.is_list() {
            // Liveness of the tail was promised when the iterator was created
            self.cell = Some(unsafe { &*cell.tail.list_val() });
        }
        Some(cell.head)
    }
}
