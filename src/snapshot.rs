//! Immutable broadcast lists.
//!
//! A [`Snapshot`] is never modified once built. Writers derive a new snapshot from the
//! current one and publish it; emitters iterate whichever snapshot they loaded.

use std::ops::Deref;

use crate::{CallRef, EventError};

/// An immutable, non-empty, ordered list of subscribers.
pub struct Snapshot<'a, A: ?Sized + 'static, R: 'static = ()> {
    subscribers: Box<[CallRef<'a, A, R>]>,
}

/// Allocates room for exactly `len` subscribers, reporting failure instead of aborting.
fn reserve<T>(len: usize) -> Result<Vec<T>, EventError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(len)
        .map_err(|_| EventError::OutOfMemory { requested: len })?;
    Ok(slots)
}

impl<'a, A: ?Sized + 'static, R: 'static> Snapshot<'a, A, R> {
    pub(crate) fn single(subscriber: CallRef<'a, A, R>) -> Result<Self, EventError> {
        let mut slots = reserve(1)?;
        slots.push(subscriber);
        Ok(Snapshot {
            subscribers: slots.into_boxed_slice(),
        })
    }

    /// Copy of `self` with `subscriber` appended.
    pub(crate) fn appended(&self, subscriber: CallRef<'a, A, R>) -> Result<Self, EventError> {
        let mut slots = reserve(self.subscribers.len() + 1)?;
        slots.extend_from_slice(&self.subscribers);
        slots.push(subscriber);
        Ok(Snapshot {
            subscribers: slots.into_boxed_slice(),
        })
    }

    /// Index of the first subscriber equal to `subscriber`.
    pub(crate) fn position(&self, subscriber: &CallRef<'_, A, R>) -> Option<usize> {
        self.subscribers.iter().position(|s| s == subscriber)
    }

    /// Copy of `self` without the entry at `index`, or `None` if nothing would remain.
    pub(crate) fn without(&self, index: usize) -> Result<Option<Self>, EventError> {
        let remaining = self.subscribers.len() - 1;
        if remaining == 0 {
            return Ok(None);
        }

        let mut slots = reserve(remaining)?;
        slots.extend_from_slice(&self.subscribers[..index]);
        slots.extend_from_slice(&self.subscribers[index + 1..]);
        Ok(Some(Snapshot {
            subscribers: slots.into_boxed_slice(),
        }))
    }

    /// The subscribers in delivery order.
    pub fn as_slice(&self) -> &[CallRef<'a, A, R>] {
        &self.subscribers
    }
}

impl<'a, A: ?Sized + 'static, R: 'static> Deref for Snapshot<'a, A, R> {
    type Target = [CallRef<'a, A, R>];

    fn deref(&self) -> &Self::Target {
        &self.subscribers
    }
}

impl<A: ?Sized + 'static, R: 'static> std::fmt::Debug for Snapshot<'_, A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.subscribers.iter()).finish()
    }
}
