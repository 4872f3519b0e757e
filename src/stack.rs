//! The pivot stack: boundary positions encoding the implicit tree.
//!
//! A leftmost skeleton tree is not a pointer structure. Its shape lives in a
//! stack of absolute array positions: the entry at depth 0 is the fictitious
//! pivot (one past the last live element, never a stored value), and each
//! deeper entry is a real pivot at a smaller absolute position, farther
//! left in the array. A subtree is
//! just a stack depth; flattening a subtree is discarding stack entries.

/// Stack of pivot positions, customized for LST use:
///
/// 1. `pop` discards any number of entries at once and returns nothing
///    (flattening a subtree is a single depth adjustment);
/// 2. arbitrary entries can be fetched and rewritten, because bucket moves
///    must keep entries pointing at the pivots' current slots.
///
/// `pop` only lowers the depth counter; the buffer is never truncated.
/// Entries just discarded by a flatten stay readable until the next push:
/// the insert and delete cascades that run immediately after a flatten read
/// them to find the old pivot positions.
pub(crate) struct PivotStack {
    depth: usize,
    data: Vec<usize>,
}

impl PivotStack {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            depth: 0,
            data: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, position: usize) {
        if self.depth == self.data.len() {
            self.data.push(position);
        } else {
            self.data[self.depth] = position;
        }
        self.depth += 1;
    }

    /// Discards the top `n` entries. The fictitious pivot at depth 0 is
    /// permanent, so `n` must leave at least one entry.
    pub(crate) fn pop(&mut self, n: usize) {
        debug_assert!(n < self.depth, "the fictitious pivot is permanent");
        self.depth -= n;
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn get(&self, index: usize) -> usize {
        self.data[index]
    }

    pub(crate) fn set(&mut self, index: usize, position: usize) {
        self.data[index] = position;
    }
}
