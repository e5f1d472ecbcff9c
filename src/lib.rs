//! # Concurrent Event
//!
//! A lock-free multicast event broadcaster for Rust.
//!
//! An [`Event`] delivers each emit to every subscribed [`CallRef`], inline on the
//! emitting thread. Any number of threads may emit, subscribe and unsubscribe at the
//! same time: emitters never take a lock, and handlers may subscribe or unsubscribe
//! (even themselves) while they are being run.
//!
//! ## Quick Start
//!
//! ```rust
//! use concurrent_event::Event;
//! use std::sync::Mutex;
//!
//! struct Journal {
//!     lines: Mutex<Vec<String>>,
//! }
//!
//! impl Journal {
//!     fn record(&self, value: &i32) {
//!         self.lines.lock().unwrap().push(format!("got {value}"));
//!     }
//! }
//!
//! let journal = Journal { lines: Mutex::new(Vec::new()) };
//! let event: Event<i32> = Event::new();
//!
//! event.subscribe_method(&journal, Journal::record).unwrap();
//! event.emit(&7);
//!
//! assert_eq!(*journal.lines.lock().unwrap(), vec!["got 7"]);
//! ```
//!
//! ## Features
//!
//! - **Lock-free emit**: emitters iterate an immutable, reference-counted snapshot
//! - **Snapshot isolation**: edits made by handlers only affect later emits
//! - **Cheap subscribers**: a [`CallRef`] is two machine words, copyable and comparable
//! - **Ephemeral writer lock**: no mutex exists while nobody is subscribing or unsubscribing
//!
//! ## Main Types
//!
//! - [`Event`] - the multicast event
//! - [`CallRef`] - reference to a free function or a method bound to a receiver
//! - [`Snapshot`] - an immutable broadcast list
//! - [`EventError`] - allocation failures
//! - [`define_event!`] - declare a statically allocated event

mod call_ref;
mod edit_lock;
mod event;
mod event_error;
mod macros;
mod snapshot;

// Re-export the main public API
pub use call_ref::CallRef;
pub use event::Event;
pub use event_error::EventError;
pub use snapshot::Snapshot;
