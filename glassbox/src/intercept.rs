//! Interception layer: the trap set bound to one wrapped value
//!
//! get, set, apply, construct and deleteProperty perform the real operation
//! on the original, report it, and hand back wrapped results so the walk
//! continues lazily. Existence checks, key enumeration, descriptor lookup
//! and property definition forward untouched.

use std::sync::Arc;

use crate::event::{Event, EventKind};
use crate::model::{Completion, Object, PropertyKey, ProxyHandler, Value};
use crate::path::Path;
use crate::session::SessionCore;
use crate::tracker;

pub(crate) struct Interceptor {
    session: Arc<SessionCore>,
    path: Path,
    depth: usize,
}

impl Interceptor {
    pub fn new(session: Arc<SessionCore>, path: Path, depth: usize) -> Self {
        Self {
            session,
            path,
            depth,
        }
    }

    fn event(&self, kind: EventKind, target: &Object, path: Path) -> Event {
        Event::new(self.session.id(), kind, target, path)
    }

    fn wrap_child(&self, value: Value, path: Path) -> Value {
        self.session.wrap(value, path, self.depth + 1)
    }
}

impl ProxyHandler for Interceptor {
    fn get(&self, target: &Object, key: &PropertyKey) -> Completion {
        let path = self.path.child(key);
        let result = match target.get(key) {
            Ok(result) => result,
            Err(thrown) => {
                let event = self.event(EventKind::Get, target, path).with_key(key);
                self.session.emit(event.with_error(thrown.value()));
                return Err(thrown);
            }
        };

        let event = self.event(EventKind::Get, target, path.clone()).with_key(key);
        self.session.emit(event.with_result(&result));

        if key.is_reserved() || result.is_deferred() {
            return Ok(result);
        }
        Ok(self.wrap_child(result, path))
    }

    fn set(&self, target: &Object, key: &PropertyKey, value: Value) -> Completion<bool> {
        let outcome = target.set(key, value.clone());
        let event = self
            .event(EventKind::Set, target, self.path.child(key))
            .with_key(key)
            .with_value(&value);
        self.session.emit(event);
        outcome
    }

    fn delete_property(&self, target: &Object, key: &PropertyKey) -> Completion<bool> {
        let event = self
            .event(EventKind::DeleteProperty, target, self.path.child(key))
            .with_key(key);
        self.session.emit(event);
        target.delete(key)
    }

    fn apply(&self, target: &Object, this: &Value, args: &[Value]) -> Completion {
        let result = match target.call(this, args) {
            Ok(result) => result,
            Err(thrown) => {
                let event = self.event(EventKind::Apply, target, self.path.clone()).with_args(args);
                self.session.emit(event.with_error(thrown.value()));
                return Err(thrown);
            }
        };

        let event = self.event(EventKind::Apply, target, self.path.clone()).with_args(args);
        if let Value::Deferred(deferred) = &result {
            // The outcome arrives later as apply:resolved / apply:rejected
            self.session.emit(event.deferred());
            tracker::track(&self.session, deferred, target, self.path.clone(), args);
            return Ok(result);
        }

        self.session.emit(event.with_result(&result));
        Ok(self.wrap_child(result, self.path.call_result()))
    }

    fn construct(&self, target: &Object, args: &[Value]) -> Completion {
        let instance = match target.construct(args) {
            Ok(instance) => instance,
            Err(thrown) => {
                let event = self.event(EventKind::Construct, target, self.path.clone()).with_args(args);
                self.session.emit(event.with_error(thrown.value()));
                return Err(thrown);
            }
        };

        let event = self.event(EventKind::Construct, target, self.path.clone()).with_args(args);
        self.session.emit(event.with_result(&instance));
        Ok(self.wrap_child(instance, self.path.constructed()))
    }
}
