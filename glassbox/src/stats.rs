//! Per-session counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of a session's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Events delivered to the observer
    pub events_emitted: u64,

    /// Events rejected by the filter
    pub events_filtered: u64,

    /// Observer calls that returned an error or panicked
    pub observer_failures: u64,

    /// Wrappers created
    pub wrappers_created: u64,

    /// Wrap attempts that fell back to the original value
    pub wrap_degradations: u64,

    /// Deferred results handed to the settlement tracker
    pub settlements_tracked: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub events_emitted: AtomicU64,
    pub events_filtered: AtomicU64,
    pub observer_failures: AtomicU64,
    pub wrappers_created: AtomicU64,
    pub wrap_degradations: AtomicU64,
    pub settlements_tracked: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            events_emitted: self.events_emitted.load(Ordering::SeqCst),
            events_filtered: self.events_filtered.load(Ordering::SeqCst),
            observer_failures: self.observer_failures.load(Ordering::SeqCst),
            wrappers_created: self.wrappers_created.load(Ordering::SeqCst),
            wrap_degradations: self.wrap_degradations.load(Ordering::SeqCst),
            settlements_tracked: self.settlements_tracked.load(Ordering::SeqCst),
        }
    }
}
