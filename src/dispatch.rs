//! Per-kind request gating.
//!
//! Every trigger the UI can fire (generate, execute, fetch schema) runs at
//! most once at a time. A second trigger while one is running is rejected
//! rather than queued, so completions land in the order they were started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Tagged result of a UI trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// The request ran and its result was applied.
    Completed(T),
    /// Input was empty after trimming; nothing was sent.
    Blank,
    /// A request of the same kind is still in flight; nothing was sent.
    Busy,
    /// The owning workspace was torn down while the request was in flight;
    /// the result was dropped without touching any state.
    Discarded,
}

impl<T> Dispatch<T> {
    /// Returns the completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Short label for logs and headless output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Blank => "blank",
            Self::Busy => "busy",
            Self::Discarded => "discarded",
        }
    }
}

/// In-flight flag for one kind of request.
#[derive(Debug, Clone, Default)]
pub struct InFlightSlot {
    busy: Arc<AtomicBool>,
}

impl InFlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot. Returns `None` if a request already holds it.
    ///
    /// The slot is released when the returned guard drops, including when
    /// the owning future is dropped mid-request.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its slot on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Locks shared controller state.
///
/// State is only ever touched in short synchronous sections, so a poisoned
/// lock still holds a consistent value and is recovered rather than
/// propagated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
