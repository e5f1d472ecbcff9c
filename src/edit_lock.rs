//! The ephemeral editing mutex that serialises writers of one event.
//!
//! No mutex exists while an event is idle. The first writer to arrive installs a
//! reference-counted [`EditLock`]; later writers join it by raising its writer count
//! with compare-and-swap against a value of at least one. The writer that brings the
//! count to zero retires the record. A retired record is never revived: a writer that
//! observes a zero count installs a fresh record instead.

use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwapOption;

struct EditLock {
    writers: AtomicUsize,
    lock: Mutex<()>,
}

impl EditLock {
    /// A record already owned by the writer that creates it.
    fn new() -> Self {
        EditLock {
            writers: AtomicUsize::new(1),
            lock: Mutex::new(()),
        }
    }

    /// Registers one more writer unless the record has been retired.
    fn try_join(&self) -> bool {
        let mut writers = self.writers.load(Ordering::Acquire);
        while writers != 0 {
            match self.writers.compare_exchange_weak(
                writers,
                writers + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => writers = actual,
            }
        }
        false
    }
}

fn as_ptr(record: &Option<Arc<EditLock>>) -> *const EditLock {
    record.as_ref().map_or(ptr::null(), Arc::as_ptr)
}

/// Atomically replaceable handle to the current editing mutex, if any.
pub(crate) struct EditSlot {
    record: ArcSwapOption<EditLock>,
}

impl EditSlot {
    pub(crate) fn new() -> Self {
        EditSlot {
            record: ArcSwapOption::empty(),
        }
    }

    /// Joins or installs the editing mutex. The returned ticket keeps it alive.
    pub(crate) fn enter(&self) -> EditTicket<'_> {
        loop {
            let installed = self.record.load_full();
            if let Some(record) = &installed {
                if record.try_join() {
                    return EditTicket {
                        slot: self,
                        record: Arc::clone(record),
                    };
                }
            }

            // Nothing installed, or a retired record still in place: replace exactly
            // what was observed. Holding `installed` keeps its address from being reused.
            let expected = as_ptr(&installed);
            let fresh = Arc::new(EditLock::new());
            let previous = self
                .record
                .compare_and_swap(expected, Some(Arc::clone(&fresh)));

            if ptr::eq(as_ptr(&*previous), expected) {
                tracing::trace!("installed editing mutex");
                return EditTicket {
                    slot: self,
                    record: fresh,
                };
            }
        }
    }

    /// Whether no writer currently holds an editing mutex.
    pub(crate) fn is_vacant(&self) -> bool {
        self.record.load().is_none()
    }
}

/// One writer's share of the editing mutex.
///
/// Dropping the ticket releases the share and retires the record if it was the last one.
pub(crate) struct EditTicket<'s> {
    slot: &'s EditSlot,
    record: Arc<EditLock>,
}

impl EditTicket<'_> {
    /// Blocks until no other writer is editing.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.record.lock.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for EditTicket<'_> {
    fn drop(&mut self) {
        if self.record.writers.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Only clear the slot if it still holds this record; a racing writer may
            // already have replaced it.
            self.slot
                .record
                .compare_and_swap(Arc::as_ptr(&self.record), None::<Arc<EditLock>>);
            tracing::trace!("retired editing mutex");
        }
    }
}
