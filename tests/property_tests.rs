//! Property-based tests using proptest
//!
//! These tests generate random operation sequences and check the tree
//! against a naive model: popped values must always be the model minimum,
//! and the element count must follow inserts and removals exactly.

use std::cmp::Ordering;
use std::rc::Rc;

use proptest::prelude::*;

use lst_heap::{Lst, LstIndex, LstItem};

struct Thing {
    value: i32,
    index: LstIndex,
}

impl LstItem for Thing {
    fn lst_index(&self) -> &LstIndex {
        &self.index
    }
}

fn thing(value: i32) -> Rc<Thing> {
    Rc::new(Thing {
        value,
        index: LstIndex::new(),
    })
}

fn by_value(a: &Thing, b: &Thing) -> Ordering {
    a.value.cmp(&b.value)
}

type Cmp = fn(&Thing, &Thing) -> Ordering;

fn make(seed: u64) -> Lst<Thing, Cmp> {
    Lst::seeded(by_value, seed)
}

proptest! {
    /// Inserting any multiset of values and popping them all yields a
    /// non-decreasing sequence of the same length.
    #[test]
    fn pops_come_out_sorted(seed: u64, values in prop::collection::vec(any::<i32>(), 0..300)) {
        let mut lst = make(seed);
        for &v in &values {
            lst.insert(thing(v)).unwrap();
        }
        prop_assert_eq!(lst.len(), values.len());

        let mut sorted = values;
        sorted.sort_unstable();
        for &expected in &sorted {
            prop_assert_eq!(lst.pop().unwrap().value, expected);
        }
        prop_assert!(lst.pop().is_none());
    }

    /// Interleaved inserts and pops always pop the current minimum.
    #[test]
    fn mixed_ops_track_model(seed: u64, ops in prop::collection::vec((any::<bool>(), any::<i32>()), 0..400)) {
        let mut lst = make(seed);
        let mut model: Vec<i32> = Vec::new();

        for (should_pop, value) in ops {
            if should_pop && !model.is_empty() {
                let popped = lst.pop().unwrap();
                let min = *model.iter().min().unwrap();
                prop_assert_eq!(popped.value, min);
                let at = model.iter().position(|&v| v == min).unwrap();
                model.swap_remove(at);
            } else {
                lst.insert(thing(value)).unwrap();
                model.push(value);
            }
            prop_assert_eq!(lst.len(), model.len());

            if !model.is_empty() {
                let expected = *model.iter().min().unwrap();
                prop_assert_eq!(lst.peek().unwrap().value, expected);
            } else {
                prop_assert!(lst.peek().is_none());
            }
        }
    }

    /// Arbitrary-element removal keeps the count and the membership flags
    /// consistent, and never disturbs the remaining order.
    #[test]
    fn removals_conserve_membership(
        seed: u64,
        values in prop::collection::vec(-1000i32..1000, 1..200),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let mut lst = make(seed);
        let mut live: Vec<Rc<Thing>> = Vec::new();

        for &v in &values {
            let t = thing(v);
            lst.insert(Rc::clone(&t)).unwrap();
            live.push(t);
        }
        // Give the tree some pivot structure before deleting from it.
        let _ = lst.peek();

        for pick in picks {
            if live.is_empty() {
                break;
            }
            let victim = live.swap_remove(pick.index(live.len()));
            let removed = lst.remove(&victim).unwrap();
            prop_assert!(Rc::ptr_eq(&removed, &victim));
            prop_assert!(!victim.lst_index().is_queued());
            prop_assert_eq!(lst.len(), live.len());

            // Removing again must fail and change nothing.
            prop_assert!(lst.remove(&victim).is_err());
            prop_assert_eq!(lst.len(), live.len());
        }

        for t in &live {
            prop_assert!(t.lst_index().is_queued());
        }

        let mut rest: Vec<i32> = live.iter().map(|t| t.value).collect();
        rest.sort_unstable();
        for &expected in &rest {
            prop_assert_eq!(lst.pop().unwrap().value, expected);
        }
        prop_assert!(lst.is_empty());
    }

    /// Re-inserting a previously removed element behaves like a fresh
    /// insert; a duplicate insert is rejected without a size change.
    #[test]
    fn reinsertion_round_trip(seed: u64, values in prop::collection::vec(any::<i32>(), 1..100)) {
        let mut lst = make(seed);
        let things: Vec<_> = values.iter().copied().map(thing).collect();
        for t in &things {
            lst.insert(Rc::clone(t)).unwrap();
        }

        for t in &things {
            prop_assert!(lst.insert(Rc::clone(t)).is_err());
        }
        prop_assert_eq!(lst.len(), things.len());

        // Remove every other element and put them all back.
        for t in things.iter().step_by(2) {
            lst.remove(t).unwrap();
        }
        for t in things.iter().step_by(2) {
            lst.insert(Rc::clone(t)).unwrap();
        }
        prop_assert_eq!(lst.len(), things.len());

        let mut sorted = values;
        sorted.sort_unstable();
        for &expected in &sorted {
            prop_assert_eq!(lst.pop().unwrap().value, expected);
        }
    }

    /// Iteration visits every live element exactly once, unordered.
    #[test]
    fn iteration_covers_live_set(seed: u64, values in prop::collection::vec(any::<i32>(), 0..200)) {
        let mut lst = make(seed);
        let things: Vec<_> = values.iter().copied().map(thing).collect();
        for t in &things {
            lst.insert(Rc::clone(t)).unwrap();
        }
        let _ = lst.peek();

        let mut visited = vec![false; things.len()];
        for item in lst.iter() {
            let at = things
                .iter()
                .position(|t| std::ptr::eq(Rc::as_ptr(t), item))
                .unwrap();
            prop_assert!(!visited[at], "element visited twice");
            visited[at] = true;
        }
        prop_assert!(visited.iter().all(|&v| v));
    }
}
