//! Host object model
//!
//! A small dynamic object model with first-class proxies. Code that reaches
//! values through these accessor methods cannot tell a proxy from the object
//! behind it, which is what lets the instrumentation layer observe an object
//! graph transparently.
//!
//! - [`Value`]: dynamically typed values
//! - [`Object`]: shared property bags, functions, constructors and proxies
//! - [`ProxyHandler`]: the trap set a proxy routes operations through
//! - [`Deferred`]: settle-once values, awaited or observed via continuations
//! - [`Symbol`]: identity keys, including the global registry

pub mod deferred;
pub mod object;
pub mod proxy;
pub mod symbol;
pub mod value;

pub use deferred::{Deferred, Settlement, SettlementWatch};
pub use object::{NativeCtor, NativeFn, Object, ObjectId, PropertyDescriptor, WeakObject};
pub use proxy::{Forwarding, ProxyError, ProxyHandler};
pub use symbol::Symbol;
pub use value::{Completion, PropertyKey, Thrown, Value};
