//! Instrumentation sessions and the `instrument` entry point
//!
//! A session owns the wrap registry, the filter and the observer. Every
//! wrapper created while walking a graph belongs to exactly one session, and
//! sessions share no state with each other.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{InstrumentConfig, InstrumentOptions};
use crate::emitter::{Emitter, Observer};
use crate::error::{InstrumentError, InstrumentResult};
use crate::event::Event;
use crate::filter::Pattern;
use crate::intercept::Interceptor;
use crate::model::{Object, ProxyHandler, Value};
use crate::path::Path;
use crate::registry::WrapRegistry;
use crate::stats::{Counters, SessionStats};

pub(crate) struct SessionCore {
    id: Uuid,
    registry: WrapRegistry,
    emitter: Emitter,
    counters: Arc<Counters>,
}

impl SessionCore {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn emit(&self, event: Event) {
        self.emitter.emit(event);
    }

    /// Wrap `value` reached via `path`, `depth` steps from the root
    pub fn wrap(self: &Arc<Self>, value: Value, path: Path, depth: usize) -> Value {
        let session = Arc::clone(self);
        self.registry.wrap(value, depth, move || {
            Arc::new(Interceptor::new(session, path, depth)) as Arc<dyn ProxyHandler>
        })
    }
}

/// Handle to an instrumentation session
#[derive(Clone)]
pub struct Session {
    core: Arc<SessionCore>,
    enabled: bool,
}

impl Session {
    /// Start building a session
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Create a session from an observer and compiled options
    pub fn new<O: Observer + 'static>(observer: O, options: &InstrumentOptions) -> Self {
        Self::with_observer(Arc::new(observer), options)
    }

    fn with_observer(observer: Arc<dyn Observer>, options: &InstrumentOptions) -> Self {
        let counters = Arc::new(Counters::default());
        let core = SessionCore {
            id: Uuid::new_v4(),
            registry: WrapRegistry::new(options.depth_limit, counters.clone()),
            emitter: Emitter::new(options.filter(), observer, counters.clone()),
            counters,
        };
        tracing::debug!(
            session_id = %core.id,
            depth_limit = ?options.depth_limit,
            enabled = options.enabled,
            "Instrumentation session created"
        );
        Self {
            core: Arc::new(core),
            enabled: options.enabled,
        }
    }

    pub fn id(&self) -> Uuid {
        self.core.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wrap a root value
    ///
    /// Returns the target unchanged when the session is disabled, when it is
    /// not an object, or when it refuses interception.
    pub fn instrument(&self, target: Value) -> Value {
        if !self.enabled {
            return target;
        }
        self.core.wrap(target, Path::root(), 0)
    }

    /// Whether `value` is a wrapper produced by this session
    pub fn is_wrapper(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| self.core.registry.is_wrapper(obj))
    }

    /// The original behind one of this session's wrappers; anything else
    /// comes back as is
    pub fn original_of(&self, value: &Value) -> Value {
        match value.as_object() {
            Some(obj) if self.core.registry.is_wrapper(obj) => obj
                .proxy_target()
                .map(|target| Value::Object(target.clone()))
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        }
    }

    /// Live wrapper for `original`, if this session has one
    pub fn wrapper_of(&self, original: &Object) -> Option<Object> {
        self.core.registry.wrapper_of(original)
    }

    pub fn stats(&self) -> SessionStats {
        self.core.counters.snapshot()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.core.id)
            .field("enabled", &self.enabled)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Fluent session construction
#[derive(Default)]
pub struct SessionBuilder {
    observer: Option<Arc<dyn Observer>>,
    options: InstrumentOptions,
    /// First config compile failure, reported by `build`
    error: Option<InstrumentError>,
}

impl SessionBuilder {
    /// Set the observer (required)
    pub fn observer<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Replace all options
    pub fn options(mut self, options: InstrumentOptions) -> Self {
        self.options = options;
        self
    }

    /// Take options from serialized configuration
    ///
    /// Replaces the options set so far; later `enabled`, `depth_limit`,
    /// `include` and `exclude` calls refine the result. A pattern that fails
    /// to compile is reported by `build`.
    pub fn config(mut self, config: InstrumentConfig) -> Self {
        match InstrumentOptions::try_from(config) {
            Ok(options) => self.options = options,
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.options.enabled = enabled;
        self
    }

    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.options.depth_limit = Some(limit);
        self
    }

    /// Add an allow pattern
    pub fn include(mut self, pattern: impl Into<Pattern>) -> Self {
        self.options.include.get_or_insert_with(Vec::new).push(pattern.into());
        self
    }

    /// Add a deny pattern
    pub fn exclude(mut self, pattern: impl Into<Pattern>) -> Self {
        self.options.exclude.get_or_insert_with(Vec::new).push(pattern.into());
        self
    }

    /// Build the session
    pub fn build(self) -> InstrumentResult<Session> {
        let observer = self.observer.ok_or(InstrumentError::MissingObserver)?;
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(Session::with_observer(observer, &self.options))
    }
}

/// Instrument `target`, reporting every observed operation to `observer`
///
/// Returns the root wrapper, or `target` unchanged when instrumentation is
/// disabled or cannot be applied. Setup never fails: the observer is
/// required by type and options are already compiled.
pub fn instrument<O: Observer + 'static>(target: Value, observer: O, options: InstrumentOptions) -> Value {
    Session::new(observer, &options).instrument(target)
}
