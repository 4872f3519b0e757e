//! Intrusive slot tracking for elements stored in an [`Lst`](crate::Lst).
//!
//! The tree locates an element for deletion through a small cell embedded in
//! the element itself, rather than by scanning. Element types opt in by
//! holding an [`LstIndex`] and implementing [`LstItem`]:
//!
//! ```rust
//! use lst_heap::{LstIndex, LstItem};
//!
//! struct Job {
//!     deadline: u64,
//!     queue_slot: LstIndex,
//! }
//!
//! impl LstItem for Job {
//!     fn lst_index(&self) -> &LstIndex {
//!         &self.queue_slot
//!     }
//! }
//! ```
//!
//! The cell is owned by the element but written only by the tree, which keeps
//! it equal to the element's current (reduced) array slot while the element
//! is a member and clears it on removal.

use std::cell::Cell;
use std::fmt;

/// Position cell embedded in element types stored in an [`Lst`](crate::Lst).
///
/// Holds the element's current array slot while it is queued, or nothing
/// while it is not. Interior mutability lets the tree relocate elements it
/// only holds shared references to.
#[derive(Default)]
pub struct LstIndex {
    slot: Cell<Option<usize>>,
}

impl LstIndex {
    /// Creates a cell for an element that is not in any tree.
    pub fn new() -> Self {
        Self {
            slot: Cell::new(None),
        }
    }

    /// Returns true if the owning element is currently stored in a tree.
    pub fn is_queued(&self) -> bool {
        self.slot.get().is_some()
    }

    pub(crate) fn get(&self) -> Option<usize> {
        self.slot.get()
    }

    pub(crate) fn set(&self, slot: usize) {
        self.slot.set(Some(slot));
    }

    pub(crate) fn clear(&self) {
        self.slot.set(None);
    }
}

impl fmt::Debug for LstIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LstIndex").field(&self.slot.get()).finish()
    }
}

/// Capability trait for element types an [`Lst`](crate::Lst) can store.
///
/// The returned cell must belong to `self` and must not be written by the
/// caller while the element is a member; the tree keeps it consistent with
/// the element's actual position.
pub trait LstItem {
    /// Accessor for the element's embedded position cell.
    fn lst_index(&self) -> &LstIndex;
}
