//! Leftmost Skeleton Tree priority queue
//!
//! This crate implements the priority queue representation behind "stronger
//! quickheaps": a leftmost skeleton tree (LST). Instead of eagerly keeping a
//! heap invariant, an LST stores elements in a circular array split into
//! unordered *buckets* by a stack of pivots, and only partitions a bucket
//! when an operation needs to look inside it. Randomized flattening during
//! insertion keeps the deferred work bounded.
//!
//! # Operations
//!
//! | Operation | Expected amortized cost |
//! |-----------|-------------------------|
//! | `insert`  | O(log n)                |
//! | `peek`    | O(log n)                |
//! | `pop`     | O(log n)                |
//! | `remove`  | O(log n)                |
//! | `len`     | O(1)                    |
//!
//! `remove` deletes an arbitrary element in place, located through an
//! intrusive index cell the element type embeds (see [`LstItem`]), with no
//! scanning and no separate handle table.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use lst_heap::{Lst, LstIndex, LstItem};
//!
//! struct Task {
//!     priority: u32,
//!     slot: LstIndex,
//! }
//!
//! impl LstItem for Task {
//!     fn lst_index(&self) -> &LstIndex {
//!         &self.slot
//!     }
//! }
//!
//! let mut queue = Lst::new(|a: &Task, b: &Task| a.priority.cmp(&b.priority));
//! let urgent = Rc::new(Task { priority: 1, slot: LstIndex::new() });
//! queue.insert(Rc::new(Task { priority: 5, slot: LstIndex::new() })).unwrap();
//! queue.insert(Rc::clone(&urgent)).unwrap();
//!
//! assert_eq!(queue.peek().unwrap().priority, 1);
//! queue.remove(&urgent).unwrap();
//! assert_eq!(queue.pop().unwrap().priority, 5);
//! ```
//!
//! # References
//!
//! - Navarro, G., Paredes, R., Poblete, P. V., & Sanders, P. (2011).
//!   "Stronger Quickheaps." *International Journal of Foundations of
//!   Computer Science*, 22(4), 945-969.

mod index;
mod lst;
mod stack;

pub use index::{LstIndex, LstItem};
pub use lst::{Iter, Lst, LstError};
