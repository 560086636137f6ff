//! Symbols: opaque property keys with identity semantics

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide registry backing `Symbol::for_key`
static GLOBAL_REGISTRY: LazyLock<Mutex<HashMap<String, Symbol>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static ITERATOR: LazyLock<Symbol> =
    LazyLock::new(|| Symbol::well_known("Symbol.iterator"));
static ASYNC_ITERATOR: LazyLock<Symbol> =
    LazyLock::new(|| Symbol::well_known("Symbol.asyncIterator"));
static TO_PRIMITIVE: LazyLock<Symbol> =
    LazyLock::new(|| Symbol::well_known("Symbol.toPrimitive"));
static TO_STRING_TAG: LazyLock<Symbol> =
    LazyLock::new(|| Symbol::well_known("Symbol.toStringTag"));
static HAS_INSTANCE: LazyLock<Symbol> =
    LazyLock::new(|| Symbol::well_known("Symbol.hasInstance"));

#[derive(Debug)]
struct SymbolInner {
    id: u64,
    description: Option<String>,
    /// Key under which the symbol lives in the global registry
    registered_key: Option<String>,
    well_known: bool,
}

/// A unique, identity-compared key
///
/// Two symbols are equal only if they are the same symbol; the description is
/// diagnostic text and carries no identity.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

impl Symbol {
    /// Create a fresh symbol
    pub fn new(description: Option<&str>) -> Self {
        Self::build(description.map(str::to_string), None, false)
    }

    /// Return the globally registered symbol for `key`, creating it on first use
    pub fn for_key(key: &str) -> Self {
        let mut registry = GLOBAL_REGISTRY.lock();
        registry
            .entry(key.to_string())
            .or_insert_with(|| Self::build(Some(key.to_string()), Some(key.to_string()), false))
            .clone()
    }

    fn well_known(description: &str) -> Self {
        Self::build(Some(description.to_string()), None, true)
    }

    fn build(description: Option<String>, registered_key: Option<String>, well_known: bool) -> Self {
        Self(Arc::new(SymbolInner {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
            registered_key,
            well_known,
        }))
    }

    pub fn iterator() -> Self {
        ITERATOR.clone()
    }

    pub fn async_iterator() -> Self {
        ASYNC_ITERATOR.clone()
    }

    pub fn to_primitive() -> Self {
        TO_PRIMITIVE.clone()
    }

    pub fn to_string_tag() -> Self {
        TO_STRING_TAG.clone()
    }

    pub fn has_instance() -> Self {
        HAS_INSTANCE.clone()
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// Registry key, if this symbol came from `Symbol::for_key`
    pub fn registered_key(&self) -> Option<&str> {
        self.0.registered_key.as_deref()
    }

    /// Whether this is one of the protocol symbols (iteration, conversion, ...)
    pub fn is_well_known(&self) -> bool {
        self.0.well_known
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}
