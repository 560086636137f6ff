//! glassbox - transparent instrumentation for object graphs
//!
//! glassbox wraps a root value so that every structural interaction with it,
//! and with everything reachable from it, is reported as an [`Event`]:
//! property reads, writes and deletions, calls, constructions, and the later
//! settlement of deferred call results. Callers see the same values and the
//! same failures they would see without instrumentation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         SESSION                               │
//! │                                                               │
//! │   wrapper ──► ┌──────────────┐   wrap child  ┌─────────────┐  │
//! │   operation   │ Interception │ ────────────► │    Wrap     │  │
//! │               │    Layer     │               │  Registry   │  │
//! │               └──────┬───────┘               └─────────────┘  │
//! │                      │ event        deferred                  │
//! │                      │        ┌──────────────┐                │
//! │                      │        │   Tracker    │ (later turn)   │
//! │                      ▼        └──────┬───────┘                │
//! │               ┌──────────────┐       │                        │
//! │               │   Emitter    │ ◄─────┘                        │
//! │               │ (Path+Filter)│ ──► observer                   │
//! │               └──────────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rust has no native way to intercept member access on arbitrary values,
//! so glassbox carries its own object model ([`model`]) with first-class
//! proxies. Code written against [`Object`]'s accessor methods cannot tell a
//! wrapper from the value behind it.
//!
//! ## Usage
//!
//! ```rust
//! use glassbox::{instrument, EventKind, EventLog, InstrumentOptions, Value};
//! use serde_json::json;
//!
//! let user = Value::from_json(&json!({ "address": { "city": "Boston" } }));
//! let log = EventLog::new();
//! let wrapped = instrument(user, log.clone(), InstrumentOptions::default());
//!
//! let address = wrapped.as_object().unwrap().get("address").unwrap();
//! address.as_object().unwrap().set("city", "New York").unwrap();
//!
//! assert_eq!(
//!     log.trail(),
//!     vec![
//!         (EventKind::Get, "address".to_string()),
//!         (EventKind::Set, "address.city".to_string()),
//!     ]
//! );
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod event;
pub mod filter;
pub mod model;
pub mod path;
pub mod session;
pub mod stats;

mod intercept;
mod registry;
mod tracker;

pub use config::{InstrumentConfig, InstrumentOptions, PatternConfig};
pub use emitter::{observe_fn, EventLog, Observer, ObserverResult};
pub use error::{InstrumentError, InstrumentResult};
pub use event::{Event, EventKind, EventSummary};
pub use filter::{PathFilter, Pattern};
pub use model::{
    Completion, Deferred, Object, ObjectId, PropertyDescriptor, PropertyKey, ProxyHandler,
    Settlement, SettlementWatch, Symbol, Thrown, Value,
};
pub use path::{Path, Segment};
pub use session::{instrument, Session, SessionBuilder};
pub use stats::SessionStats;
