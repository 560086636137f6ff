//! Objects: shared, identity-compared property bags with optional call and
//! construct behavior, plus proxies over them

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::proxy::{ProxyError, ProxyHandler};
use super::value::{Completion, PropertyKey, Thrown, Value};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Call behavior: `(this, args) -> result`
pub type NativeFn = Arc<dyn Fn(&Value, &[Value]) -> Completion + Send + Sync>;

/// Construct behavior: `args -> instance`
pub type NativeCtor = Arc<dyn Fn(&[Value]) -> Completion + Send + Sync>;

/// Stable identity of an object for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A data property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub value: Value,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn hidden(value: impl Into<Value>) -> Self {
        Self {
            enumerable: false,
            ..Self::data(value)
        }
    }
}

struct Slot {
    key: PropertyKey,
    descriptor: PropertyDescriptor,
}

struct OrdinaryState {
    /// Insertion-ordered properties
    slots: Vec<Slot>,
    prototype: Option<Object>,
    extensible: bool,
}

impl OrdinaryState {
    fn find(&self, key: &PropertyKey) -> Option<&Slot> {
        self.slots.iter().find(|slot| &slot.key == key)
    }

    fn find_mut(&mut self, key: &PropertyKey) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| &slot.key == key)
    }
}

enum Kind {
    Ordinary {
        state: RwLock<OrdinaryState>,
        call: Option<NativeFn>,
        construct: Option<NativeCtor>,
        name: Option<String>,
    },
    Proxy {
        target: Object,
        handler: Arc<dyn ProxyHandler>,
    },
}

struct ObjectInner {
    id: ObjectId,
    kind: Kind,
    proxyable: AtomicBool,
}

/// Handle to a shared object
///
/// Cloning the handle shares the object; equality is identity.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

/// Non-owning handle to an object
#[derive(Clone)]
pub struct WeakObject(Weak<ObjectInner>);

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Object {
    fn from_kind(kind: Kind) -> Self {
        Self(Arc::new(ObjectInner {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            proxyable: AtomicBool::new(true),
        }))
    }

    fn ordinary(
        prototype: Option<Object>,
        call: Option<NativeFn>,
        construct: Option<NativeCtor>,
        name: Option<String>,
    ) -> Self {
        Self::from_kind(Kind::Ordinary {
            state: RwLock::new(OrdinaryState {
                slots: Vec::new(),
                prototype,
                extensible: true,
            }),
            call,
            construct,
            name,
        })
    }

    /// Create an empty object
    pub fn new() -> Self {
        Self::ordinary(None, None, None, None)
    }

    /// Create an empty object inheriting from `prototype`
    pub fn with_prototype(prototype: Object) -> Self {
        Self::ordinary(Some(prototype), None, None, None)
    }

    /// Create an array-like object with index keys
    pub fn array(items: Vec<Value>) -> Self {
        let obj = Self::new();
        for (i, item) in items.into_iter().enumerate() {
            obj.insert(i, item);
        }
        obj
    }

    /// Create a callable object
    pub fn function<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Completion + Send + Sync + 'static,
    {
        Self::ordinary(None, Some(Arc::new(f)), None, Some(name.to_string()))
    }

    /// Create a constructible object
    pub fn constructor<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Completion + Send + Sync + 'static,
    {
        Self::ordinary(None, None, Some(Arc::new(f)), Some(name.to_string()))
    }

    /// Create a class-like constructor
    ///
    /// Construction creates an instance inheriting from `prototype`, runs
    /// `init` against it and returns it. The constructor exposes the
    /// prototype under a non-enumerable `prototype` key.
    pub fn class<F>(name: &str, prototype: Object, init: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Completion<()> + Send + Sync + 'static,
    {
        let proto = prototype.clone();
        let ctor = Self::constructor(name, move |args| {
            let instance = Object::with_prototype(proto.clone());
            init(&instance, args)?;
            Ok(Value::Object(instance))
        });
        let _ = ctor.define_property("prototype", PropertyDescriptor::hidden(prototype));
        ctor
    }

    /// Create a proxy whose structural operations go through `handler`
    pub fn proxy(target: &Object, handler: Arc<dyn ProxyHandler>) -> Result<Object, ProxyError> {
        if !target.is_proxyable() {
            return Err(ProxyError::NotProxyable { id: target.id() });
        }
        Ok(Self::from_kind(Kind::Proxy {
            target: target.clone(),
            handler,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.0))
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.kind, Kind::Proxy { .. })
    }

    /// Target of a proxy, `None` for ordinary objects
    pub fn proxy_target(&self) -> Option<&Object> {
        match &self.0.kind {
            Kind::Proxy { target, .. } => Some(target),
            Kind::Ordinary { .. } => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        match &self.0.kind {
            Kind::Ordinary { call, .. } => call.is_some(),
            Kind::Proxy { target, .. } => target.is_callable(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match &self.0.kind {
            Kind::Ordinary { construct, .. } => construct.is_some(),
            Kind::Proxy { target, .. } => target.is_constructor(),
        }
    }

    /// Mark whether proxies may be created over this object
    pub fn set_proxyable(&self, proxyable: bool) {
        self.0.proxyable.store(proxyable, Ordering::SeqCst);
    }

    pub fn is_proxyable(&self) -> bool {
        self.0.proxyable.load(Ordering::SeqCst)
    }

    pub fn prototype(&self) -> Option<Object> {
        match &self.0.kind {
            Kind::Ordinary { state, .. } => state.read().prototype.clone(),
            Kind::Proxy { target, .. } => target.prototype(),
        }
    }

    /// Make every own property read-only and the object non-extensible
    pub fn freeze(&self) {
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let mut state = state.write();
                for slot in &mut state.slots {
                    slot.descriptor.writable = false;
                    slot.descriptor.configurable = false;
                }
                state.extensible = false;
            }
            Kind::Proxy { target, .. } => target.freeze(),
        }
    }

    pub fn is_extensible(&self) -> bool {
        match &self.0.kind {
            Kind::Ordinary { state, .. } => state.read().extensible,
            Kind::Proxy { target, .. } => target.is_extensible(),
        }
    }

    /// Define a plain data property, ignoring failure
    pub fn insert(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        let _ = self.define_property(key, PropertyDescriptor::data(value));
    }

    /// Read a property, walking the prototype chain
    pub fn get(&self, key: impl Into<PropertyKey>) -> Completion {
        let key = key.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let prototype = {
                    let state = state.read();
                    if let Some(slot) = state.find(&key) {
                        return Ok(slot.descriptor.value.clone());
                    }
                    state.prototype.clone()
                };
                match prototype {
                    Some(proto) => proto.get(key),
                    None => Ok(Value::Undefined),
                }
            }
            Kind::Proxy { target, handler } => handler.get(target, &key),
        }
    }

    /// Write a property; `false` when the write is refused
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Completion<bool> {
        let key = key.into();
        let value = value.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let mut state = state.write();
                if let Some(slot) = state.find_mut(&key) {
                    if !slot.descriptor.writable {
                        return Ok(false);
                    }
                    slot.descriptor.value = value;
                    return Ok(true);
                }
                if !state.extensible {
                    return Ok(false);
                }
                state.slots.push(Slot {
                    key,
                    descriptor: PropertyDescriptor::data(value),
                });
                Ok(true)
            }
            Kind::Proxy { target, handler } => handler.set(target, &key, value),
        }
    }

    /// Remove an own property; `false` when it is not configurable
    pub fn delete(&self, key: impl Into<PropertyKey>) -> Completion<bool> {
        let key = key.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let mut state = state.write();
                match state.slots.iter().position(|slot| slot.key == key) {
                    Some(pos) if !state.slots[pos].descriptor.configurable => Ok(false),
                    Some(pos) => {
                        state.slots.remove(pos);
                        Ok(true)
                    }
                    None => Ok(true),
                }
            }
            Kind::Proxy { target, handler } => handler.delete_property(target, &key),
        }
    }

    /// Whether the key exists on the object or its prototype chain
    pub fn has(&self, key: impl Into<PropertyKey>) -> Completion<bool> {
        let key = key.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let prototype = {
                    let state = state.read();
                    if state.find(&key).is_some() {
                        return Ok(true);
                    }
                    state.prototype.clone()
                };
                match prototype {
                    Some(proto) => proto.has(key),
                    None => Ok(false),
                }
            }
            Kind::Proxy { target, handler } => handler.has(target, &key),
        }
    }

    /// Own keys in insertion order
    pub fn own_keys(&self) -> Completion<Vec<PropertyKey>> {
        match &self.0.kind {
            Kind::Ordinary { state, .. } => Ok(state
                .read()
                .slots
                .iter()
                .filter(|slot| slot.descriptor.enumerable)
                .map(|slot| slot.key.clone())
                .collect()),
            Kind::Proxy { target, handler } => handler.own_keys(target),
        }
    }

    pub fn get_own_property(
        &self,
        key: impl Into<PropertyKey>,
    ) -> Completion<Option<PropertyDescriptor>> {
        let key = key.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                Ok(state.read().find(&key).map(|slot| slot.descriptor.clone()))
            }
            Kind::Proxy { target, handler } => handler.get_own_property(target, &key),
        }
    }

    /// Define or redefine an own property
    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        descriptor: PropertyDescriptor,
    ) -> Completion<bool> {
        let key = key.into();
        match &self.0.kind {
            Kind::Ordinary { state, .. } => {
                let mut state = state.write();
                if let Some(slot) = state.find_mut(&key) {
                    if !slot.descriptor.configurable {
                        return Ok(false);
                    }
                    slot.descriptor = descriptor;
                    return Ok(true);
                }
                if !state.extensible {
                    return Ok(false);
                }
                state.slots.push(Slot { key, descriptor });
                Ok(true)
            }
            Kind::Proxy { target, handler } => handler.define_property(target, &key, descriptor),
        }
    }

    /// Invoke the object as a function
    pub fn call(&self, this: &Value, args: &[Value]) -> Completion {
        match &self.0.kind {
            Kind::Ordinary { call: Some(f), .. } => (**f)(this, args),
            Kind::Ordinary { .. } => Err(Thrown::type_error(&format!("{self:?} is not a function"))),
            Kind::Proxy { target, handler } => {
                if !target.is_callable() {
                    return Err(Thrown::type_error(&format!("{self:?} is not a function")));
                }
                handler.apply(target, this, args)
            }
        }
    }

    /// Invoke the object as a constructor
    pub fn construct(&self, args: &[Value]) -> Completion {
        match &self.0.kind {
            Kind::Ordinary { construct: Some(f), .. } => (**f)(args),
            Kind::Ordinary { .. } => {
                Err(Thrown::type_error(&format!("{self:?} is not a constructor")))
            }
            Kind::Proxy { target, handler } => {
                if !target.is_constructor() {
                    return Err(Thrown::type_error(&format!("{self:?} is not a constructor")));
                }
                handler.construct(target, args)
            }
        }
    }

    /// Read `key` and call it with this object as `this`
    pub fn invoke(&self, key: impl Into<PropertyKey>, args: &[Value]) -> Completion {
        let key = key.into();
        match self.get(&key)? {
            Value::Object(method) => method.call(&Value::Object(self.clone()), args),
            _ => Err(Thrown::type_error(&format!("{key:?} is not a function"))),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Ordinary { name: Some(name), .. } => write!(f, "[Function {name}]{}", self.id()),
            Kind::Ordinary { .. } => write!(f, "[Object]{}", self.id()),
            Kind::Proxy { target, .. } => write!(f, "[Proxy]{} -> {target:?}", self.id()),
        }
    }
}
