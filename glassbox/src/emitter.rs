//! Event emission: filtering plus observer isolation
//!
//! Every event passes through [`Emitter::emit`]. Rejected accessors cost one
//! filter check. Accepted events go to the observer, whose errors and panics
//! are logged and dropped; nothing an observer does can change the outcome
//! of the operation being observed.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{Event, EventKind};
use crate::filter::PathFilter;
use crate::stats::Counters;

/// Result returned by observers
pub type ObserverResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives events from an instrumentation session
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event) -> ObserverResult;
}

impl<F> Observer for F
where
    F: Fn(&Event) -> ObserverResult + Send + Sync,
{
    fn on_event(&self, event: &Event) -> ObserverResult {
        self(event)
    }
}

/// Adapt an infallible closure into an observer
pub fn observe_fn<F>(f: F) -> impl Observer
where
    F: Fn(&Event) + Send + Sync,
{
    move |event: &Event| -> ObserverResult {
        f(event);
        Ok(())
    }
}

/// Observer that records every event it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Recorded events of one kind
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events.lock().iter().filter(|e| e.kind == kind).cloned().collect()
    }

    /// `(kind, accessor)` pairs, oldest first
    pub fn trail(&self) -> Vec<(EventKind, String)> {
        self.events.lock().iter().map(|e| (e.kind, e.accessor())).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Observer for EventLog {
    fn on_event(&self, event: &Event) -> ObserverResult {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

pub(crate) struct Emitter {
    filter: PathFilter,
    observer: Arc<dyn Observer>,
    counters: Arc<Counters>,
}

impl Emitter {
    pub fn new(filter: PathFilter, observer: Arc<dyn Observer>, counters: Arc<Counters>) -> Self {
        Self {
            filter,
            observer,
            counters,
        }
    }

    /// Filter, then deliver to the observer with failures contained
    pub fn emit(&self, event: Event) {
        let accessor = event.accessor();
        if !self.filter.should_report(&accessor) {
            Counters::bump(&self.counters.events_filtered);
            return;
        }
        Counters::bump(&self.counters.events_emitted);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.observer.on_event(&event)));
        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        Counters::bump(&self.counters.observer_failures);
        tracing::warn!(
            kind = %event.kind,
            accessor = %accessor,
            error = %failure,
            "Observer failed; event dropped"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
