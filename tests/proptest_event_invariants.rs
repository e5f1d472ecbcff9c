//! Property-based invariant tests for a single event driven by random edit sequences.
//!
//! These tests check the event against a plain `Vec` model of its subscriber list:
//!
//! 1. `count()` always equals the model length.
//! 2. `unsubscribe` returns true iff the model holds a matching entry, and removes the first one.
//! 3. An emit invokes exactly the model's entries, in model order.
//! 4. `k` subscriptions of one callable need exactly `k` unsubscriptions.
//! 5. Edits on a clone never show up in the original, and vice versa.

use concurrent_event::Event;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

// ── Helpers ─────────────────────────────────────────────────────────────

const TAPS: usize = 4;

/// A receiver that writes its id into a shared trail when fired.
struct Tap {
    id: usize,
    trail: Arc<Mutex<Vec<usize>>>,
}

impl Tap {
    fn fire(&self, _: &()) {
        self.trail.lock().unwrap().push(self.id);
    }
}

/// The trail shared by every tap of one test case.
struct Rig {
    trail: Arc<Mutex<Vec<usize>>>,
}

impl Rig {
    fn new() -> Self {
        Rig {
            trail: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn taps(&self) -> Vec<Tap> {
        (0..TAPS)
            .map(|id| Tap {
                id,
                trail: Arc::clone(&self.trail),
            })
            .collect()
    }

    fn drain(&self) -> Vec<usize> {
        std::mem::take(&mut *self.trail.lock().unwrap())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Subscribe(usize),
    Unsubscribe(usize),
    Emit,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..TAPS).prop_map(Op::Subscribe),
        2 => (0..TAPS).prop_map(Op::Unsubscribe),
        1 => Just(Op::Emit),
    ]
}

/// Applies `op` to both the event and the model, checking they agree.
fn apply<'a>(
    event: &Event<'a, ()>,
    taps: &'a [Tap],
    model: &mut Vec<usize>,
    rig: &Rig,
    op: &Op,
) -> Result<(), TestCaseError> {
    match *op {
        Op::Subscribe(id) => {
            event.subscribe_method(&taps[id], Tap::fire).unwrap();
            model.push(id);
        }
        Op::Unsubscribe(id) => {
            let removed = event.unsubscribe_method(&taps[id], Tap::fire).unwrap();
            let expected = model.iter().position(|&m| m == id);
            prop_assert_eq!(removed, expected.is_some());
            if let Some(index) = expected {
                model.remove(index);
            }
        }
        Op::Emit => {
            rig.drain();
            event.emit(&());
            prop_assert_eq!(&rig.drain(), &*model);
        }
    }
    prop_assert_eq!(event.count(), model.len());
    Ok(())
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn event_matches_vec_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let rig = Rig::new();
        let taps = rig.taps();
        let event: Event<()> = Event::new();
        let mut model = Vec::new();

        for op in &ops {
            apply(&event, &taps, &mut model, &rig, op)?;
        }

        rig.drain();
        event.emit(&());
        prop_assert_eq!(rig.drain(), model);
    }

    #[test]
    fn duplicates_need_as_many_unsubscriptions(k in 0usize..12) {
        let rig = Rig::new();
        let taps = rig.taps();
        let event: Event<()> = Event::new();

        for _ in 0..k {
            event.subscribe_method(&taps[0], Tap::fire).unwrap();
        }
        event.emit(&());
        prop_assert_eq!(rig.drain().len(), k);

        for _ in 0..k {
            prop_assert!(event.unsubscribe_method(&taps[0], Tap::fire).unwrap());
        }
        prop_assert!(!event.unsubscribe_method(&taps[0], Tap::fire).unwrap());
        prop_assert_eq!(event.count(), 0);

        event.emit(&());
        prop_assert!(rig.drain().is_empty());
    }

    #[test]
    fn clone_edits_stay_independent(
        setup in prop::collection::vec(0..TAPS, 0..8),
        left in prop::collection::vec(op_strategy(), 0..24),
        right in prop::collection::vec(op_strategy(), 0..24),
    ) {
        let rig = Rig::new();
        let taps = rig.taps();
        let original: Event<()> = Event::new();
        for &id in &setup {
            original.subscribe_method(&taps[id], Tap::fire).unwrap();
        }

        let copy = original.clone();
        let mut original_model = setup.clone();
        let mut copy_model = setup;

        for op in &left {
            apply(&original, &taps, &mut original_model, &rig, op)?;
        }
        for op in &right {
            apply(&copy, &taps, &mut copy_model, &rig, op)?;
        }

        prop_assert_eq!(original.count(), original_model.len());
        prop_assert_eq!(copy.count(), copy_model.len());
    }
}
