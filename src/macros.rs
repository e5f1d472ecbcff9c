//! Macros for declaring statically allocated events.

/// Declares a module holding one process-wide [`Event`](crate::Event).
///
/// The generated module contains a lazily initialised static event and free functions
/// that forward to it. Free-function handlers can reach the event they are subscribed
/// to through these functions, which is what makes self-unsubscribing handlers easy.
///
/// - `define_event!(name, A)` declares an `Event<'static, A>` (handlers return `()`).
/// - `define_event!(name, A => R)` declares an `Event<'static, A, R>`.
///
/// `A` and `R` may name types declared in the module that invokes the macro.
///
/// ```rust
/// use concurrent_event::define_event;
///
/// pub struct Resized {
///     pub width: u16,
/// }
///
/// define_event!(resized, Resized => u16);
///
/// fn main() {
///     resized::subscribe_fn(|r: &Resized| r.width).unwrap();
///     assert_eq!(resized::event().call(&Resized { width: 80 }).unwrap(), vec![80]);
/// }
/// ```
///
/// # Examples
///
/// ```rust
/// use concurrent_event::define_event;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// define_event!(shutdown, str);
///
/// static SEEN: AtomicUsize = AtomicUsize::new(0);
///
/// fn once(_reason: &str) {
///     SEEN.fetch_add(1, Ordering::SeqCst);
///     shutdown::unsubscribe_fn(once).unwrap();
/// }
///
/// shutdown::subscribe_fn(once).unwrap();
/// shutdown::emit("signal");
/// shutdown::emit("signal");
///
/// assert_eq!(SEEN.load(Ordering::SeqCst), 1);
/// assert_eq!(shutdown::count(), 0);
/// ```
///
/// The full [`Event`](crate::Event) API is available through `event()`:
///
/// ```rust
/// use concurrent_event::define_event;
///
/// define_event!(measure, str => usize);
///
/// measure::subscribe_fn(|s: &str| s.len()).unwrap();
/// assert_eq!(measure::event().call("four").unwrap(), vec![4]);
/// ```
#[macro_export]
macro_rules! define_event {
    ($name:ident, $args:ty => $ret:ty) => {
        pub mod $name {
            #![allow(dead_code)]

            // Payload types declared next to the invocation.
            #[allow(unused_imports)]
            use super::*;
            use std::sync::LazyLock;

            // Module-private storage for the event.
            static EVENT: LazyLock<$crate::Event<'static, $args, $ret>> =
                LazyLock::new($crate::Event::new);

            /// The underlying event.
            pub fn event() -> &'static $crate::Event<'static, $args, $ret> {
                &EVENT
            }

            /// Subscribe a callable reference.
            pub fn subscribe(
                subscriber: $crate::CallRef<'static, $args, $ret>,
            ) -> Result<(), $crate::EventError> {
                EVENT.subscribe(subscriber)
            }

            /// Subscribe a free function or a closure that captures nothing.
            pub fn subscribe_fn<F>(target: F) -> Result<(), $crate::EventError>
            where
                F: Fn(&$args) -> $ret + Copy + Send + Sync + 'static,
            {
                EVENT.subscribe_fn(target)
            }

            /// Unsubscribe one subscription of a callable reference.
            pub fn unsubscribe(
                subscriber: $crate::CallRef<'_, $args, $ret>,
            ) -> Result<bool, $crate::EventError> {
                EVENT.unsubscribe(subscriber)
            }

            /// Unsubscribe one subscription of a free function.
            pub fn unsubscribe_fn<F>(target: F) -> Result<bool, $crate::EventError>
            where
                F: Fn(&$args) -> $ret + Copy + Send + Sync + 'static,
            {
                EVENT.unsubscribe_fn(target)
            }

            /// Number of subscribers.
            pub fn count() -> usize {
                EVENT.count()
            }

            /// Invoke every subscriber, discarding results.
            pub fn emit(args: &$args) {
                EVENT.emit(args)
            }
        }
    };
    ($name:ident, $args:ty) => {
        $crate::define_event!($name, $args => ());
    };
}
