//! Wrap registry: at most one wrapper per original
//!
//! Entries hold weak handles on both sides, so the registry never keeps an
//! original or its wrapper alive. Lookup, construction and insertion happen
//! under one lock, which keeps check-then-act atomic when several threads
//! touch the same instrumented graph.
//!
//! Wrapping is lazy: a wrapper's children are wrapped only when read through
//! it, so `wrap` never recurses. A cycle such as `a.b.a` comes back around
//! to an original that already has a live wrapper and ends in a cache hit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{Object, ObjectId, ProxyHandler, Value, WeakObject};
use crate::stats::Counters;

/// Dead entries are swept once the map reaches this size, then at double
/// the surviving count.
const INITIAL_SWEEP_AT: usize = 64;

struct Entry {
    original: WeakObject,
    wrapper: WeakObject,
    wrapper_id: ObjectId,
}

impl Entry {
    fn is_alive(&self) -> bool {
        self.original.is_alive() && self.wrapper.is_alive()
    }
}

struct RegistryState {
    /// Original id -> wrapper
    entries: HashMap<ObjectId, Entry>,
    /// Wrapper id -> original id, to recognize our own wrappers; holds only
    /// the wrapper currently recorded in `entries`
    wrappers: HashMap<ObjectId, ObjectId>,
    sweep_at: usize,
}

impl RegistryState {
    fn sweep(&mut self) {
        self.entries.retain(|_, entry| entry.is_alive());
        let live = &self.entries;
        self.wrappers.retain(|wrapper_id, original| {
            live.get(original).is_some_and(|entry| entry.wrapper_id == *wrapper_id)
        });
        self.sweep_at = (self.entries.len() * 2).max(INITIAL_SWEEP_AT);
    }

    fn record(&mut self, original: &Object, wrapper: &Object) {
        let entry = Entry {
            original: original.downgrade(),
            wrapper: wrapper.downgrade(),
            wrapper_id: wrapper.id(),
        };
        if let Some(replaced) = self.entries.insert(original.id(), entry) {
            self.wrappers.remove(&replaced.wrapper_id);
        }
        self.wrappers.insert(wrapper.id(), original.id());
    }
}

pub(crate) struct WrapRegistry {
    depth_limit: Option<usize>,
    state: Mutex<RegistryState>,
    counters: Arc<Counters>,
}

impl WrapRegistry {
    pub fn new(depth_limit: Option<usize>, counters: Arc<Counters>) -> Self {
        Self {
            depth_limit,
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                wrappers: HashMap::new(),
                sweep_at: INITIAL_SWEEP_AT,
            }),
            counters,
        }
    }

    /// Return the wrapper for `value`, creating it with `make_handler` if needed
    ///
    /// Primitives, deferreds, values beyond the depth limit, our own
    /// wrappers and targets that refuse interception all come back unchanged.
    pub fn wrap<F>(&self, value: Value, depth: usize, make_handler: F) -> Value
    where
        F: FnOnce() -> Arc<dyn ProxyHandler>,
    {
        let original = match &value {
            Value::Object(obj) => obj.clone(),
            _ => return value,
        };

        if self.depth_limit.is_some_and(|limit| depth > limit) {
            return value;
        }

        let mut state = self.state.lock();

        if let Some(wrapper) = state.entries.get(&original.id()).and_then(|e| e.wrapper.upgrade()) {
            tracing::trace!(original = %original.id(), "Wrapper cache hit");
            return Value::Object(wrapper);
        }

        if state.wrappers.contains_key(&original.id()) {
            return value;
        }

        match Object::proxy(&original, make_handler()) {
            Ok(wrapper) => {
                if state.entries.len() >= state.sweep_at {
                    state.sweep();
                }
                state.record(&original, &wrapper);
                Counters::bump(&self.counters.wrappers_created);
                Value::Object(wrapper)
            }
            Err(e) => {
                Counters::bump(&self.counters.wrap_degradations);
                tracing::debug!(error = %e, "Interception unavailable; passing original through");
                value
            }
        }
    }

    /// Live wrapper for `original`, if one exists
    pub fn wrapper_of(&self, original: &Object) -> Option<Object> {
        self.state
            .lock()
            .entries
            .get(&original.id())
            .and_then(|e| e.wrapper.upgrade())
    }

    /// Whether `obj` is a live wrapper created by this registry
    pub fn is_wrapper(&self, obj: &Object) -> bool {
        let state = self.state.lock();
        state
            .wrappers
            .get(&obj.id())
            .and_then(|original| state.entries.get(original))
            .is_some_and(Entry::is_alive)
    }

    /// Number of entries whose original and wrapper are both alive
    #[cfg(test)]
    pub fn live_entries(&self) -> usize {
        self.state.lock().entries.values().filter(|e| e.is_alive()).count()
    }
}
