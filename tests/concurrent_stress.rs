//! Integration tests running writers and emitters against one event from many threads.
//!
//! These tests are CPU heavy, so they run one at a time.

use concurrent_event::Event;
use serial_test::serial;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

struct Probe {
    hits: AtomicUsize,
}

impl Probe {
    fn new() -> Self {
        Probe {
            hits: AtomicUsize::new(0),
        }
    }

    fn hit(&self, _: &u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[test]
#[serial]
fn test_writers_race_an_emitter_and_leave_event_empty() {
    const WRITERS: usize = 8;
    const PAIRS: usize = 10_000;

    let probes: Vec<Probe> = (0..WRITERS).map(|_| Probe::new()).collect();
    let event: Event<u64> = Event::new();
    let done = AtomicBool::new(false);
    let barrier = Barrier::new(WRITERS + 1);

    let emits = thread::scope(|s| {
        let emitter = s.spawn(|| {
            barrier.wait();
            let mut emitted = 0u64;
            while !done.load(Ordering::Acquire) {
                event.emit(&emitted);
                emitted += 1;
            }
            emitted
        });

        let writers: Vec<_> = probes
            .iter()
            .map(|probe| {
                let event = &event;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    for _ in 0..PAIRS {
                        event.subscribe_method(probe, Probe::hit).unwrap();
                        assert!(event.unsubscribe_method(probe, Probe::hit).unwrap());
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        emitter.join().unwrap()
    });

    assert!(emits > 0);
    assert_eq!(event.count(), 0);
    assert!(event.snapshot().is_none());
    assert_eq!(
        format!("{:?}", event),
        "Event { subscribers: 0, editing: false }"
    );

    // Nothing is subscribed any more, so further emits reach nobody.
    let before: Vec<usize> = probes.iter().map(Probe::hits).collect();
    event.emit(&0);
    let after: Vec<usize> = probes.iter().map(Probe::hits).collect();
    assert_eq!(before, after);
}

#[test]
#[serial]
fn test_concurrent_subscriptions_are_all_published() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 250;

    let probes: Vec<Probe> = (0..WRITERS).map(|_| Probe::new()).collect();
    let event: Event<u64> = Event::new();

    thread::scope(|s| {
        for probe in &probes {
            let event = &event;
            s.spawn(move || {
                for _ in 0..PER_WRITER {
                    event.subscribe_method(probe, Probe::hit).unwrap();
                }
            });
        }
    });

    assert_eq!(event.count(), WRITERS * PER_WRITER);

    event.emit(&0);
    for probe in &probes {
        assert_eq!(probe.hits(), PER_WRITER);
    }
}

#[test]
#[serial]
fn test_concurrent_emitters_deliver_every_call() {
    const EMITTERS: usize = 4;
    const EMITS: usize = 5_000;

    let first = Probe::new();
    let second = Probe::new();
    let event: Event<u64> = Event::new();
    event.subscribe_method(&first, Probe::hit).unwrap();
    event.subscribe_method(&second, Probe::hit).unwrap();

    thread::scope(|s| {
        for _ in 0..EMITTERS {
            s.spawn(|| {
                for n in 0..EMITS as u64 {
                    event.emit(&n);
                }
            });
        }
    });

    assert_eq!(first.hits(), EMITTERS * EMITS);
    assert_eq!(second.hits(), EMITTERS * EMITS);
}

#[test]
#[serial]
fn test_emit_sees_one_consistent_snapshot() {
    const ROUNDS: usize = 2_000;

    struct Slot {
        index: usize,
    }

    fn index_of(slot: &Slot, _round: &u64) -> usize {
        slot.index
    }

    let slots: Vec<Slot> = (0..4).map(|index| Slot { index }).collect();
    let event: Event<u64, usize> = Event::new();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..ROUNDS {
                for slot in &slots {
                    event.subscribe_method(slot, index_of).unwrap();
                }
                for slot in &slots {
                    assert!(event.unsubscribe_method(slot, index_of).unwrap());
                }
            }
            done.store(true, Ordering::Release);
        });

        s.spawn(|| {
            let mut round = 1u64;
            while !done.load(Ordering::Acquire) {
                let results = event.call(&round).unwrap();
                // Subscriptions are appended in index order and removed from the front,
                // so every published list is a contiguous run of ascending indices.
                assert!(results.windows(2).all(|pair| pair[1] == pair[0] + 1));
                round += 1;
            }
        });
    });

    assert_eq!(event.count(), 0);
}
