//! Dynamic values, property keys and thrown failures

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use super::deferred::Deferred;
use super::object::{Object, ObjectId};
use super::symbol::Symbol;

/// Outcome of an operation that may throw
pub type Completion<T = Value> = Result<T, Thrown>;

/// A failure raised by a host operation, carrying the thrown value
#[derive(Error, Debug, Clone, PartialEq)]
#[error("uncaught {0}")]
pub struct Thrown(pub Value);

impl Thrown {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn type_error(message: &str) -> Self {
        Self(Value::from(format!("TypeError: {message}")))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Symbol(Symbol),
    Object(Object),
    Deferred(Deferred),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether this value settles later (success or failure known only later)
    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Value::Deferred(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Build a fresh object graph from JSON
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::from(s.as_str()),
            JsonValue::Array(items) => {
                Value::Object(Object::array(items.iter().map(Value::from_json).collect()))
            }
            JsonValue::Object(map) => {
                let obj = Object::new();
                for (k, v) in map {
                    obj.insert(k.as_str(), Value::from_json(v));
                }
                Value::Object(obj)
            }
        }
    }

    /// Render as JSON, reading own enumerable string/index properties
    ///
    /// Reads go through `get`, so rendering a wrapper is itself observed.
    /// Functions, symbols, deferreds and repeated objects on the current
    /// branch render as `null`.
    pub fn to_json(&self) -> JsonValue {
        let mut visiting = HashSet::new();
        self.to_json_inner(&mut visiting)
    }

    fn to_json_inner(&self, visiting: &mut HashSet<ObjectId>) -> JsonValue {
        match self {
            Value::Undefined | Value::Null | Value::Symbol(_) | Value::Deferred(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.to_string()),
            Value::Object(obj) => {
                if obj.is_callable() || !visiting.insert(obj.id()) {
                    return JsonValue::Null;
                }
                let keys = obj.own_keys().unwrap_or_default();
                let json = if !keys.is_empty() && keys.iter().all(|k| matches!(k, PropertyKey::Index(_))) {
                    JsonValue::Array(
                        keys.iter()
                            .map(|k| obj.get(k).unwrap_or_default().to_json_inner(visiting))
                            .collect(),
                    )
                } else {
                    let mut map = serde_json::Map::new();
                    for key in keys {
                        let name = match &key {
                            PropertyKey::String(s) => s.to_string(),
                            PropertyKey::Index(i) => i.to_string(),
                            PropertyKey::Symbol(_) => continue,
                        };
                        let value = obj.get(&key).unwrap_or_default();
                        map.insert(name, value.to_json_inner(visiting));
                    }
                    JsonValue::Object(map)
                };
                visiting.remove(&obj.id());
                json
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Deferred(d) => write!(f, "{d:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Value::Deferred(d)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

/// A property key
///
/// Canonical array-index strings normalize to `Index`, so `"2"` and `2`
/// name the same property.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Arc<str>),
    Index(u32),
    Symbol(Symbol),
}

impl PropertyKey {
    /// Keys belonging to the host's own structural protocols
    ///
    /// Well-known symbols and `__`-prefixed names are never wrapped on read.
    pub fn is_reserved(&self) -> bool {
        match self {
            PropertyKey::Symbol(sym) => sym.is_well_known(),
            PropertyKey::String(name) => name.starts_with("__"),
            PropertyKey::Index(_) => false,
        }
    }
}

fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match parse_index(s) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(Arc::from(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Index(i)
    }
}

impl From<usize> for PropertyKey {
    fn from(i: usize) -> Self {
        match u32::try_from(i) {
            Ok(i) if i != u32::MAX => PropertyKey::Index(i),
            _ => PropertyKey::String(Arc::from(i.to_string())),
        }
    }
}

impl From<Symbol> for PropertyKey {
    fn from(s: Symbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(k: &PropertyKey) -> Self {
        k.clone()
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s:?}"),
            PropertyKey::Index(i) => write!(f, "{i}"),
            PropertyKey::Symbol(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<PropertyKey> for Value {
    fn from(key: PropertyKey) -> Self {
        match key {
            PropertyKey::String(s) => Value::String(s),
            PropertyKey::Index(i) => Value::Number(i as f64),
            PropertyKey::Symbol(s) => Value::Symbol(s),
        }
    }
}
