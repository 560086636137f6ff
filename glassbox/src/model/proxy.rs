//! Proxy handlers: the seam where structural operations can be intercepted
//!
//! An object created with [`Object::proxy`] routes every structural
//! operation through a [`ProxyHandler`]. Each trap defaults to forwarding the
//! operation to the target unchanged, so a handler only overrides the
//! operations it cares about.

use thiserror::Error;

use super::object::{Object, ObjectId, PropertyDescriptor};
use super::value::{Completion, PropertyKey, Value};

/// Failure to establish a proxy over a target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Target refuses interception
    #[error("Object {id} cannot be proxied")]
    NotProxyable { id: ObjectId },
}

/// Trap set bound to a proxy
pub trait ProxyHandler: Send + Sync {
    fn get(&self, target: &Object, key: &PropertyKey) -> Completion {
        target.get(key)
    }

    fn set(&self, target: &Object, key: &PropertyKey, value: Value) -> Completion<bool> {
        target.set(key, value)
    }

    fn delete_property(&self, target: &Object, key: &PropertyKey) -> Completion<bool> {
        target.delete(key)
    }

    fn apply(&self, target: &Object, this: &Value, args: &[Value]) -> Completion {
        target.call(this, args)
    }

    fn construct(&self, target: &Object, args: &[Value]) -> Completion {
        target.construct(args)
    }

    fn has(&self, target: &Object, key: &PropertyKey) -> Completion<bool> {
        target.has(key)
    }

    fn own_keys(&self, target: &Object) -> Completion<Vec<PropertyKey>> {
        target.own_keys()
    }

    fn get_own_property(
        &self,
        target: &Object,
        key: &PropertyKey,
    ) -> Completion<Option<PropertyDescriptor>> {
        target.get_own_property(key)
    }

    fn define_property(
        &self,
        target: &Object,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Completion<bool> {
        target.define_property(key, descriptor)
    }
}

/// Handler that forwards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Forwarding;

impl ProxyHandler for Forwarding {}
