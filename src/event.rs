//! The concurrent multicast event.
//!
//! An [`Event`] keeps its subscribers in an immutable [`Snapshot`] behind an atomically
//! replaceable handle. Emitting loads the current snapshot and walks it without taking
//! any lock. Subscribing and unsubscribing build a new snapshot and publish it while
//! holding the event's ephemeral editing mutex, which only serialises writers.
//!
//! Because an emit holds on to the snapshot it loaded, a handler may subscribe or
//! unsubscribe (itself included) without affecting the emit that is running; the change
//! is seen by the next emit.
//!
//! # Examples
//!
//! ```
//! use concurrent_event::Event;
//!
//! fn double(x: &i32) -> i32 {
//!     x * 2
//! }
//!
//! fn triple(x: &i32) -> i32 {
//!     x * 3
//! }
//!
//! let event: Event<i32, i32> = Event::new();
//! event.subscribe_fn(double)?;
//! event.subscribe_fn(triple)?;
//!
//! assert_eq!(event.call(&5)?, vec![10, 15]);
//! assert!(event.unsubscribe_fn(double)?);
//! assert_eq!(event.count(), 1);
//! # Ok::<(), concurrent_event::EventError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::edit_lock::EditSlot;
use crate::{CallRef, EventError, Snapshot};

/// Outcome of a writer's build step.
enum Edit<S> {
    /// Leave the current snapshot in place.
    Keep,
    /// Publish the new snapshot, or the empty handle for `None`.
    Publish(Option<S>),
}

/// A multicast event whose handlers have the signature `fn(&A) -> R`.
///
/// `'a` bounds the receivers bound into the event's subscribers. See the
/// [module documentation](self) for the delivery rules.
pub struct Event<'a, A: ?Sized + 'static, R: 'static = ()> {
    current: ArcSwapOption<Snapshot<'a, A, R>>,
    editor: EditSlot,
}

impl<'a, A: ?Sized + 'static, R: 'static> Event<'a, A, R> {
    /// Creates an event with no subscribers.
    pub fn new() -> Self {
        Event {
            current: ArcSwapOption::empty(),
            editor: EditSlot::new(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Writers
    // ---------------------------------------------------------------------------------------------

    /// Runs one read-copy-update cycle under the editing mutex.
    ///
    /// Returns the length of the published snapshot, or `None` if nothing was published.
    fn edit<F>(&self, build: F) -> Result<Option<usize>, EventError>
    where
        F: FnOnce(Option<&Snapshot<'a, A, R>>) -> Result<Edit<Snapshot<'a, A, R>>, EventError>,
    {
        let ticket = self.editor.enter();
        let _serialised = ticket.lock();

        let current = self.current.load_full();
        match build(current.as_deref())? {
            Edit::Keep => Ok(None),
            Edit::Publish(next) => {
                let len = next.as_ref().map_or(0, |snapshot| snapshot.len());
                self.current.store(next.map(Arc::new));
                Ok(Some(len))
            }
        }
    }

    /// Appends `subscriber` to the broadcast list.
    ///
    /// Subscribing the same callable twice makes it fire twice per emit.
    ///
    /// # Errors
    ///
    /// [`EventError::OutOfMemory`] if the new list cannot be allocated; the event is unchanged.
    pub fn subscribe(&self, subscriber: CallRef<'a, A, R>) -> Result<(), EventError> {
        let published = self.edit(|current| {
            let next = match current {
                Some(snapshot) => snapshot.appended(subscriber)?,
                None => Snapshot::single(subscriber)?,
            };
            Ok(Edit::Publish(Some(next)))
        })?;

        tracing::trace!(
            handler = subscriber.target_name(),
            subscribers = published.unwrap_or_default(),
            "subscribed"
        );
        Ok(())
    }

    /// Removes the first subscriber equal to `subscriber`.
    ///
    /// Returns `Ok(false)` and leaves the event untouched if there is no such subscriber.
    ///
    /// # Errors
    ///
    /// [`EventError::OutOfMemory`] if the new list cannot be allocated; the event is unchanged.
    pub fn unsubscribe(&self, subscriber: CallRef<'_, A, R>) -> Result<bool, EventError> {
        let published = self.edit(|current| {
            let found = current
                .and_then(|snapshot| snapshot.position(&subscriber).map(|index| (snapshot, index)));
            match found {
                Some((snapshot, index)) => Ok(Edit::Publish(snapshot.without(index)?)),
                None => Ok(Edit::Keep),
            }
        })?;

        match published {
            Some(remaining) => {
                tracing::trace!(
                    handler = subscriber.target_name(),
                    subscribers = remaining,
                    "unsubscribed"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every subscriber.
    pub fn clear(&self) {
        let cleared = self.edit(|current| {
            Ok(match current {
                Some(_) => Edit::Publish(None),
                None => Edit::Keep,
            })
        });

        if let Ok(Some(_)) = cleared {
            tracing::trace!("cleared subscribers");
        }
    }

    /// Subscribes a free function or a closure that captures nothing.
    pub fn subscribe_fn<F>(&self, target: F) -> Result<(), EventError>
    where
        F: Fn(&A) -> R + Copy + Send + Sync + 'static,
    {
        self.subscribe(CallRef::free(target))
    }

    /// Unsubscribes one subscription of a free function.
    pub fn unsubscribe_fn<F>(&self, target: F) -> Result<bool, EventError>
    where
        F: Fn(&A) -> R + Copy + Send + Sync + 'static,
    {
        self.unsubscribe(CallRef::free(target))
    }

    /// Subscribes a `&self` method bound to `receiver`.
    pub fn subscribe_method<C, M>(&self, receiver: &'a C, target: M) -> Result<(), EventError>
    where
        C: Sync + 'static,
        M: Fn(&C, &A) -> R + Copy + Send + Sync + 'static,
    {
        self.subscribe(CallRef::method(receiver, target))
    }

    /// Unsubscribes one subscription of a `&self` method bound to `receiver`.
    pub fn unsubscribe_method<C, M>(&self, receiver: &C, target: M) -> Result<bool, EventError>
    where
        C: Sync + 'static,
        M: Fn(&C, &A) -> R + Copy + Send + Sync + 'static,
    {
        self.unsubscribe(CallRef::method(receiver, target))
    }

    /// Subscribes a `&mut self` method bound to `receiver`.
    ///
    /// The exclusive borrow cannot be taken again while the event holds it, so the bound
    /// [`CallRef`] is returned for a later [`unsubscribe`](Self::unsubscribe).
    ///
    /// # Safety
    ///
    /// Same contract as [`CallRef::method_mut`]: this event must never run the handler
    /// twice at once, so it must not be emitted concurrently or from inside the handler.
    pub unsafe fn subscribe_method_mut<C, M>(
        &self,
        receiver: &'a mut C,
        target: M,
    ) -> Result<CallRef<'a, A, R>, EventError>
    where
        C: Send + 'static,
        M: Fn(&mut C, &A) -> R + Copy + Send + Sync + 'static,
    {
        let subscriber = unsafe { CallRef::method_mut(receiver, target) };
        self.subscribe(subscriber)?;
        Ok(subscriber)
    }

    // ---------------------------------------------------------------------------------------------
    // Readers
    // ---------------------------------------------------------------------------------------------

    /// Number of subscribers at this instant.
    pub fn count(&self) -> usize {
        (*self.current.load())
            .as_ref()
            .map_or(0, |snapshot| snapshot.len())
    }

    /// Whether the event has no subscribers at this instant.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_none()
    }

    /// Whether a subscriber equal to `subscriber` is currently subscribed.
    pub fn contains(&self, subscriber: CallRef<'_, A, R>) -> bool {
        (*self.current.load())
            .as_ref()
            .is_some_and(|snapshot| snapshot.position(&subscriber).is_some())
    }

    /// The current broadcast list, if any subscriber exists.
    pub fn snapshot(&self) -> Option<Arc<Snapshot<'a, A, R>>> {
        self.current.load_full()
    }

    /// Invokes every subscriber in subscription order, discarding their results.
    ///
    /// A panicking handler stops the emit; the remaining handlers are not invoked.
    pub fn emit(&self, args: &A) {
        let Some(snapshot) = self.current.load_full() else {
            return;
        };

        for subscriber in snapshot.iter() {
            let _ = subscriber.invoke(args);
        }
    }

    /// Invokes every subscriber and appends each result to `out`, in subscription order.
    pub fn collect<E: Extend<R>>(&self, args: &A, out: &mut E) {
        if let Some(snapshot) = self.current.load_full() {
            out.extend(snapshot.iter().map(|subscriber| subscriber.invoke(args)));
        }
    }

    /// Invokes every subscriber and returns their results in subscription order.
    ///
    /// # Errors
    ///
    /// [`EventError::OutOfMemory`] if the result buffer cannot be allocated. No handler
    /// has run in that case.
    pub fn call(&self, args: &A) -> Result<Vec<R>, EventError> {
        let Some(snapshot) = self.current.load_full() else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        results
            .try_reserve_exact(snapshot.len())
            .map_err(|_| EventError::OutOfMemory {
                requested: snapshot.len(),
            })?;
        results.extend(snapshot.iter().map(|subscriber| subscriber.invoke(args)));
        Ok(results)
    }

    /// Moves the subscribers out, leaving an empty event behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<'a, A: ?Sized + 'static, T: 'static, E: 'static> Event<'a, A, Result<T, E>> {
    /// Invokes subscribers in order until one returns an error, which is returned.
    ///
    /// Handlers after the failing one are not invoked.
    ///
    /// ```
    /// use concurrent_event::Event;
    ///
    /// fn accept(_: &str) -> Result<(), String> {
    ///     Ok(())
    /// }
    ///
    /// fn reject(line: &str) -> Result<(), String> {
    ///     Err(format!("rejected {line}"))
    /// }
    ///
    /// let event: Event<str, Result<(), String>> = Event::new();
    /// event.subscribe_fn(accept).unwrap();
    /// event.subscribe_fn(reject).unwrap();
    ///
    /// assert_eq!(event.try_emit("x"), Err("rejected x".to_string()));
    /// ```
    pub fn try_emit(&self, args: &A) -> Result<(), E> {
        let Some(snapshot) = self.current.load_full() else {
            return Ok(());
        };

        for subscriber in snapshot.iter() {
            subscriber.invoke(args)?;
        }
        Ok(())
    }
}

impl<A: ?Sized + 'static, R: 'static> Default for Event<'_, A, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies share the current broadcast list but nothing else; later edits to either side
/// are invisible to the other.
impl<A: ?Sized + 'static, R: 'static> Clone for Event<'_, A, R> {
    fn clone(&self) -> Self {
        Event {
            current: ArcSwapOption::new(self.current.load_full()),
            editor: EditSlot::new(),
        }
    }
}

impl<A: ?Sized + 'static, R: 'static> fmt::Debug for Event<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.count())
            .field("editing", &!self.editor.is_vacant())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
