//! Basic usage example for concurrent-event.
//!
//! Demonstrates:
//! - Subscribing free functions and methods bound to a receiver
//! - Emitting, and collecting handler results with `call()`
//! - Unsubscribing from inside a handler
//! - Emitting from several threads while another thread edits the subscriber list
//!
//! Run with: `cargo run --example basic_usage`

use concurrent_event::{define_event, Event};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

// A process-wide event that handlers can reach by name
define_event!(greeting, str);

fn greet(name: &str) {
    println!("   Hello, {name}!");
}

fn greet_once(name: &str) {
    println!("   Nice to meet you, {name}. (unsubscribing myself)");
    greeting::unsubscribe_fn(greet_once).expect("unsubscribe greet_once");
}

struct Stats {
    seen: AtomicUsize,
}

impl Stats {
    fn record(&self, _value: &u32) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }
}

fn square(x: &u32) -> u32 {
    x * x
}

fn cube(x: &u32) -> u32 {
    x * x * x
}

fn main() {
    println!("=== concurrent-event: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Free-function handlers
    // -------------------------------------------------------------------------
    println!("1. Emitting to free functions...");

    greeting::subscribe_fn(greet).expect("subscribe greet");
    greeting::subscribe_fn(greet_once).expect("subscribe greet_once");

    greeting::emit("Ada");
    greeting::emit("Grace");

    println!("   Subscribers left: {}", greeting::count());

    // -------------------------------------------------------------------------
    // 2. Collecting results
    // -------------------------------------------------------------------------
    println!("\n2. Collecting results...");

    let powers: Event<u32, u32> = Event::new();
    powers.subscribe_fn(square).expect("subscribe square");
    powers.subscribe_fn(cube).expect("subscribe cube");

    let results = powers.call(&3).expect("allocate results");
    println!("   3 -> {:?}", results);

    // -------------------------------------------------------------------------
    // 3. Concurrent emit and edit
    // -------------------------------------------------------------------------
    println!("\n3. Emitting from 4 threads while a writer edits...");

    let stats = Stats {
        seen: AtomicUsize::new(0),
    };
    let extra = Stats {
        seen: AtomicUsize::new(0),
    };
    let numbers: Event<u32> = Event::new();
    numbers
        .subscribe_method(&stats, Stats::record)
        .expect("subscribe stats");

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for n in 0..1_000 {
                    numbers.emit(&n);
                }
            });
        }

        s.spawn(|| {
            for _ in 0..100 {
                numbers
                    .subscribe_method(&extra, Stats::record)
                    .expect("subscribe extra");
                numbers
                    .unsubscribe_method(&extra, Stats::record)
                    .expect("unsubscribe extra");
            }
        });
    });

    println!(
        "   stats saw {} emits, extra saw {} while it was subscribed",
        stats.seen.load(Ordering::Relaxed),
        extra.seen.load(Ordering::Relaxed)
    );
    println!("   {:?}", numbers);

    println!("\n=== Done ===");
}
