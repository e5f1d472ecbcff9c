use std::fmt;

/// Errors reported by event operations.
///
/// "Not subscribed" is not an error: [`Event::unsubscribe`](crate::Event::unsubscribe)
/// returns `Ok(false)` in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A subscriber snapshot or result buffer could not be allocated.
    ///
    /// The event is left exactly as it was before the call.
    OutOfMemory {
        /// Number of elements the failed allocation asked for.
        requested: usize,
    },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::OutOfMemory { requested } => {
                write!(f, "Failed to allocate space for {requested} elements")
            }
        }
    }
}

impl std::error::Error for EventError {}
