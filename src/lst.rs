//! Leftmost skeleton tree: the priority queue itself.
//!
//! The representation is a circular array of element references plus a stack
//! of pivot positions. Consecutive pivots bound *buckets*, regions whose
//! contents are unordered but lie between the bounding pivots' values. The
//! queue does as little sorting as it can get away with: a bucket is only
//! partitioned (quickselect-style, around a random pivot) when an operation
//! actually needs to look inside it, and insertion randomly flattens
//! subtrees so no region is repartitioned too often. The result is expected
//! amortized O(log n) insert, pop, and remove.
//!
//! All traversals are explicit loops over increasing stack depth; the call
//! stack never grows with the structure.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::index::LstItem;
use crate::stack::PivotStack;

/// Default number of element slots; must be a power of two.
const INITIAL_CAPACITY: usize = 2048;

/// Initial pivot stack allocation. Expected stack depth is proportional to
/// log of the element count, so growing it is a rare event.
const INITIAL_STACK_CAPACITY: usize = 32;

/// Error type for tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LstError {
    /// The element is already stored in the tree.
    AlreadyMember,
    /// The element is not currently stored in the tree.
    NotMember,
    /// Growing the element array failed; the tree is unchanged.
    AllocationFailed,
}

impl fmt::Display for LstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LstError::AlreadyMember => write!(f, "element is already in the tree"),
            LstError::NotMember => write!(f, "element is not in the tree"),
            LstError::AllocationFailed => write!(f, "allocation failed while growing the tree"),
        }
    }
}

impl std::error::Error for LstError {}

/// A leftmost skeleton tree.
///
/// Stores shared references (`Rc<T>`) to caller-owned elements and keeps
/// each element's embedded [`LstIndex`](crate::LstIndex) cell equal to its
/// current array slot, which is how [`remove`](Lst::remove) finds an element
/// without scanning.
///
/// Ordering comes from the three-way comparator supplied at construction;
/// elements that compare equal are fine and pop in an unspecified relative
/// order.
///
/// Not thread-safe: `Rc` and `Cell` keep the whole structure single-threaded
/// by construction.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use lst_heap::{Lst, LstIndex, LstItem};
///
/// struct Task {
///     priority: u32,
///     slot: LstIndex,
/// }
///
/// impl LstItem for Task {
///     fn lst_index(&self) -> &LstIndex {
///         &self.slot
///     }
/// }
///
/// let mut queue = Lst::new(|a: &Task, b: &Task| a.priority.cmp(&b.priority));
/// for priority in [3, 1, 2] {
///     queue
///         .insert(Rc::new(Task { priority, slot: LstIndex::new() }))
///         .unwrap();
/// }
/// assert_eq!(queue.pop().unwrap().priority, 1);
/// assert_eq!(queue.peek().unwrap().priority, 2);
/// ```
pub struct Lst<T: LstItem, F: Fn(&T, &T) -> Ordering> {
    /// Element slots; the live window is `[idx, idx + len)` reduced mod
    /// capacity. A slot is `Some` exactly when it is inside the window.
    slots: Box<[Option<Rc<T>>]>,
    /// Absolute position of the first live element. Kept below capacity by
    /// lazy renormalization.
    idx: usize,
    len: usize,
    stack: PivotStack,
    cmp: F,
    rng: SmallRng,
}

impl<T: LstItem, F: Fn(&T, &T) -> Ordering> Lst<T, F> {
    /// Creates an empty tree with the default initial capacity and an
    /// entropy-seeded random source.
    pub fn new(cmp: F) -> Self {
        Self::build(cmp, INITIAL_CAPACITY, SmallRng::from_entropy())
    }

    /// Creates an empty tree with at least `capacity` element slots
    /// (rounded up to a power of two).
    pub fn with_capacity(cmp: F, capacity: usize) -> Self {
        Self::build(
            cmp,
            capacity.next_power_of_two().max(2),
            SmallRng::from_entropy(),
        )
    }

    /// Creates an empty tree whose random pivot and flattening choices are
    /// driven by `seed`, for reproducible tests. Randomness only affects
    /// expected cost, never correctness.
    pub fn seeded(cmp: F, seed: u64) -> Self {
        Self::build(cmp, INITIAL_CAPACITY, SmallRng::seed_from_u64(seed))
    }

    fn build(cmp: F, capacity: usize, rng: SmallRng) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        let mut stack = PivotStack::with_capacity(INITIAL_STACK_CAPACITY);
        // The fictitious pivot: one past the logical end, permanently at
        // depth 0. The tree starts empty at position 0.
        stack.push(0);

        Self {
            slots: slots.into_boxed_slice(),
            idx: 0,
            len: 0,
            stack,
            cmp,
            rng,
        }
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element slots available before the next doubling.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Inserts an element. The tree holds one strong reference until the
    /// element is popped or removed.
    ///
    /// # Errors
    ///
    /// [`LstError::AlreadyMember`] if the element is already stored here;
    /// [`LstError::AllocationFailed`] if the tree was full and doubling the
    /// array failed. The tree is unchanged in both cases.
    pub fn insert(&mut self, item: Rc<T>) -> Result<(), LstError> {
        if self.is_member(&item) {
            return Err(LstError::AlreadyMember);
        }
        if self.len == self.capacity() {
            self.expand()?;
        }

        let mut depth = 0;
        loop {
            if self.is_bucket(depth) {
                self.bucket_add(depth, item);
                return Ok(());
            }
            depth += 1;
            let left = self.subtree_size(depth);
            // Flatten with probability 1/(size + 1): the amortization
            // mechanism that bounds how many elements are ever
            // repartitioned.
            if self.rng.gen_range(0..=left) != 0 {
                if (self.cmp)(&item, self.pivot_item(depth)) == Ordering::Less {
                    continue;
                }
                self.bucket_add(depth - 1, item);
            } else {
                self.flatten(depth);
                self.bucket_add(depth, item);
            }
            return Ok(());
        }
    }

    /// Returns the minimum element without removing it, or `None` if the
    /// tree is empty.
    ///
    /// Takes `&mut self` because finding the minimum performs the deferred
    /// partitioning work on the leftmost spine.
    pub fn peek(&mut self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let mut depth = 0;
        loop {
            if self.is_bucket(depth) {
                self.partition(depth);
            }
            depth += 1;
            if self.subtree_size(depth) == 0 {
                // Nothing left of this pivot: it is the minimum.
                return Some(self.pivot_item(depth));
            }
        }
    }

    /// Removes and returns the minimum element, or `None` if the tree is
    /// empty.
    pub fn pop(&mut self) -> Option<Rc<T>> {
        if self.len == 0 {
            return None;
        }
        let mut depth = 0;
        loop {
            if self.is_bucket(depth) {
                self.partition(depth);
            }
            depth += 1;
            if self.subtree_size(depth) == 0 {
                let min = self.occupant(self.stack.get(depth)).clone();
                self.flatten(depth);
                return Some(self.bucket_delete(depth, &min));
            }
        }
    }

    /// Removes a specific element, locating it through its embedded index
    /// cell, and returns the tree's reference to it.
    ///
    /// # Errors
    ///
    /// [`LstError::NotMember`] if the element is not currently stored in
    /// this tree (including the empty-tree case). The tree is unchanged.
    pub fn remove(&mut self, item: &T) -> Result<Rc<T>, LstError> {
        if !self.is_member(item) {
            return Err(LstError::NotMember);
        }
        let mut depth = 0;
        loop {
            if self.is_bucket(depth) {
                return Ok(self.bucket_delete(depth, item));
            }
            depth += 1;
            match (self.cmp)(item, self.pivot_item(depth)) {
                Ordering::Less => continue,
                Ordering::Greater => return Ok(self.bucket_delete(depth - 1, item)),
                Ordering::Equal => {
                    // The element sorts with this pivot, so it may sit on
                    // either side of it: give up the boundary and delete
                    // from the merged bucket.
                    self.flatten(depth);
                    return Ok(self.bucket_delete(depth, item));
                }
            }
        }
    }

    /// Visits each live element once, in storage order (not sorted).
    ///
    /// The borrow rules prevent mutating the tree while an iterator is
    /// alive, so the element set is always consistent.
    pub fn iter(&self) -> Iter<'_, T, F> {
        Iter {
            lst: self,
            position: self.idx,
        }
    }

    /// Membership test through the intrusive cell: the element is a member
    /// iff its cell holds a slot inside the current live window and that
    /// slot actually stores this element.
    fn is_member(&self, item: &T) -> bool {
        let slot = match item.lst_index().get() {
            Some(slot) => slot,
            None => return false,
        };
        // The cell may have been written by a different tree.
        if slot >= self.capacity() {
            return false;
        }
        let offset = slot.wrapping_sub(self.reduce(self.idx)) & self.mask();
        if offset >= self.len {
            return false;
        }
        match &self.slots[slot] {
            Some(stored) => std::ptr::eq(Rc::as_ptr(stored), item),
            None => false,
        }
    }

    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    /// Translates an absolute position into an array slot.
    fn reduce(&self, position: usize) -> usize {
        position & self.mask()
    }

    /// True if two absolute positions name the same slot.
    fn equivalent(&self, a: usize, b: usize) -> bool {
        self.reduce(a.wrapping_sub(b)) == 0
    }

    fn occupant(&self, position: usize) -> &Rc<T> {
        self.slots[self.reduce(position)]
            .as_ref()
            .expect("slot inside the live window")
    }

    /// Removes and returns the element at `position`, leaving a hole.
    fn take(&mut self, position: usize) -> Rc<T> {
        let slot = self.reduce(position);
        self.slots[slot].take().expect("slot inside the live window")
    }

    /// Stores an element at `position` and rewrites its index cell to
    /// match. The slot must be empty: every element lives in exactly one
    /// slot at all times.
    fn place(&mut self, position: usize, item: Rc<T>) {
        let slot = self.reduce(position);
        debug_assert!(self.slots[slot].is_none());
        item.lst_index().set(slot);
        self.slots[slot] = Some(item);
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        // A self-swap must be a no-op; the corrective move after a Hoare
        // scan can land on the slot the pivot already occupies.
        if self.equivalent(a, b) {
            return;
        }
        let item_a = self.take(a);
        let item_b = self.take(b);
        self.place(a, item_b);
        self.place(b, item_a);
    }

    /// A subtree is a bucket when it has no internal pivots left.
    fn is_bucket(&self, depth: usize) -> bool {
        self.stack.depth() - depth == 1
    }

    /// Number of elements in the subtree at `depth`, i.e. everything left
    /// of that depth's pivot.
    fn subtree_size(&self, depth: usize) -> usize {
        if depth == 0 {
            return self.len;
        }
        let right = self.reduce(self.stack.get(depth));
        let idx = self.reduce(self.idx);
        if idx <= right {
            right - idx
        } else {
            self.capacity() - idx + right
        }
    }

    /// The pivot element bounding the subtree at `depth`. Never valid for
    /// depth 0: the fictitious pivot has no stored value.
    fn pivot_item(&self, depth: usize) -> &T {
        debug_assert!(depth > 0);
        self.occupant(self.stack.get(depth))
    }

    /// First position of the bucket at `depth`. Buckets can be empty.
    fn bucket_low(&self, depth: usize) -> usize {
        if self.is_bucket(depth) {
            self.idx
        } else {
            self.stack.get(depth + 1) + 1
        }
    }

    /// Last position of the bucket at `depth` (one below its pivot).
    fn bucket_high(&self, depth: usize) -> usize {
        self.stack.get(depth) - 1
    }

    /// Collapses the subtree at `depth` into a single bucket by discarding
    /// the pivot boundaries below it. O(1); the ordering information those
    /// partitions learned is deliberately thrown away.
    fn flatten(&mut self, depth: usize) {
        self.stack.pop(self.stack.depth() - depth);
    }

    /// Splits the bucket at `depth` around a uniformly random pivot and
    /// pushes the pivot's final position as a new boundary. Only ever
    /// called on the leftmost, nonempty bucket.
    fn partition(&mut self, depth: usize) {
        let low = self.bucket_low(depth);
        let high = self.bucket_high(depth);

        // Hoare partitioning cannot handle the single-slot case.
        if self.equivalent(low, high) {
            self.stack.push(low);
            return;
        }

        let pivot_position = low + self.rng.gen_range(0..high + 1 - low);
        let pivot = self.occupant(pivot_position).clone();
        if pivot_position != low {
            self.swap_slots(low, pivot_position);
        }

        // Hoare scan: a third the swaps of Lomuto on average. Both cursors
        // start one outside the bucket and advance before every read, so
        // the transient out-of-range values are never dereferenced.
        let mut l = low.wrapping_sub(1);
        let mut h = high + 1;
        loop {
            loop {
                h -= 1;
                if (self.cmp)(self.occupant(h), &pivot) != Ordering::Greater {
                    break;
                }
            }
            loop {
                l = l.wrapping_add(1);
                if (self.cmp)(self.occupant(l), &pivot) != Ordering::Less {
                    break;
                }
            }
            if l >= h {
                break;
            }
            self.swap_slots(l, h);
        }

        // The scan does not leave the pivot at h the way the boundary
        // needs, so find where it ended up, translated back to an absolute
        // position...
        let reduced = pivot.lst_index().get().expect("pivot is stored");
        let low_reduced = self.reduce(low);
        let pivot_position = if reduced >= low_reduced {
            low + (reduced - low_reduced)
        } else {
            high - (self.reduce(high) - reduced)
        };

        // ...and give it at most one corrective move onto the boundary.
        if pivot_position < h {
            self.swap_slots(pivot_position, h);
        } else if pivot_position > h {
            h += 1;
            self.swap_slots(pivot_position, h);
        }

        self.stack.push(h);
    }

    /// Appends an element to the bucket at `depth`.
    ///
    /// Elements are never inserted in the middle of a bucket. Each bucket
    /// to the right of the target donates its top slot instead: its pivot
    /// is promoted into the slot vacated above and the bucket's bottom
    /// element fills the gap. One move per bucket suffices because order
    /// inside a bucket does not matter. The fictitious pivot has no value,
    /// so each step saves the pivot move for last.
    fn bucket_add(&mut self, depth: usize, item: Rc<T>) {
        for rindex in 0..depth {
            let prev_pivot = self.stack.get(rindex + 1);
            let new_space = self.stack.get(rindex);
            let empty_bucket = new_space - prev_pivot == 1;
            self.stack.set(rindex, new_space + 1);

            if !empty_bucket {
                let bottom = self.take(prev_pivot + 1);
                self.place(new_space, bottom);
            }

            // Move the pivot up, leaving space for the next bucket.
            let pivot = self.take(prev_pivot);
            self.place(prev_pivot + 1, pivot);
        }

        // If the target is not the leftmost bucket, the loop just vacated
        // the slot its pivot used to occupy. If it is the leftmost, the
        // slot past the fictitious pivot was free all along.
        let new_space = self.stack.get(depth);
        self.stack.set(depth, new_space + 1);
        self.place(new_space, item);

        self.len += 1;
    }

    /// Removes an element from the bucket at `depth` and returns it.
    ///
    /// Deleting the leftmost live element is O(1): advance `idx` past it.
    /// Otherwise a hole opens where the element was and rolls outward: each
    /// bucket's top element back-fills the hole, its pivot steps down into
    /// the freed boundary slot, and the cascade continues in the next
    /// bucket until the outermost boundary shrinks by one.
    fn bucket_delete(&mut self, mut depth: usize, item: &T) -> Rc<T> {
        let mut location = item.lst_index().get().expect("member has a slot");

        let removed;
        if self.equivalent(location, self.idx) {
            removed = self.take(self.idx);
            self.idx += 1;
            // Renormalize at the wrap point so absolute positions stay
            // bounded.
            if self.reduce(self.idx) == 0 {
                self.renormalize();
            }
        } else {
            removed = self.take(location);
            loop {
                let top = self.bucket_high(depth);
                if !self.equivalent(location, top) {
                    let filler = self.take(top);
                    self.place(location, filler);
                }
                self.stack.set(depth, top);
                if depth == 0 {
                    break;
                }
                let pivot = self.take(top + 1);
                self.place(top, pivot);
                depth -= 1;
                location = top + 1;
            }
        }

        debug_assert!(std::ptr::eq(Rc::as_ptr(&removed), item));
        self.len -= 1;
        removed.lst_index().clear();
        removed
    }

    /// Re-reduces `idx` and every stack entry, preserving their offsets
    /// from `idx`, so absolute positions never grow without bound.
    fn renormalize(&mut self) {
        let reduced_idx = self.reduce(self.idx);
        for i in 0..self.stack.depth() {
            let entry = self.stack.get(i);
            self.stack.set(i, reduced_idx + (entry - self.idx));
        }
        self.idx = reduced_idx;
    }

    /// Doubles the element array.
    ///
    /// The allocation is fallible; on failure the tree is untouched. On
    /// success the wrapped tail that sat before `idx` is moved forward by
    /// the old capacity, so the live window is contiguous under the larger
    /// modulus without touching the unwrapped portion.
    fn expand(&mut self) -> Result<(), LstError> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity * 2;

        let mut grown: Vec<Option<Rc<T>>> = Vec::new();
        grown
            .try_reserve_exact(new_capacity)
            .map_err(|_| LstError::AllocationFailed)?;
        grown.resize_with(new_capacity, || None);
        let mut grown = grown.into_boxed_slice();

        for (old_slot, new_slot) in self.slots.iter_mut().zip(grown.iter_mut()) {
            *new_slot = old_slot.take();
        }
        self.slots = grown;

        // Re-anchor positions before unwrapping the tail; reduction now
        // uses the larger modulus.
        self.renormalize();

        for slot in 0..self.idx {
            let wrapped = self.take(slot);
            self.place(slot + old_capacity, wrapped);
        }
        Ok(())
    }
}

impl<T: LstItem, F: Fn(&T, &T) -> Ordering> fmt::Debug for Lst<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lst")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("stack_depth", &self.stack.depth())
            .finish_non_exhaustive()
    }
}

/// Forward iterator over the live elements of an [`Lst`], in storage order.
pub struct Iter<'a, T: LstItem, F: Fn(&T, &T) -> Ordering> {
    lst: &'a Lst<T, F>,
    position: usize,
}

impl<'a, T: LstItem, F: Fn(&T, &T) -> Ordering> Iterator for Iter<'a, T, F> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        // The fictitious pivot is one past the last live element.
        if self.position == self.lst.stack.get(0) {
            return None;
        }
        let item = self.lst.occupant(self.position);
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.lst.stack.get(0) - self.position;
        (remaining, Some(remaining))
    }
}

impl<'a, T: LstItem, F: Fn(&T, &T) -> Ordering> ExactSizeIterator for Iter<'a, T, F> {}

impl<'a, T: LstItem, F: Fn(&T, &T) -> Ordering> IntoIterator for &'a Lst<T, F> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
