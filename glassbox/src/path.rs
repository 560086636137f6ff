//! Access paths and their accessor-string rendering
//!
//! A [`Path`] is the route from the instrumentation root to a nested value.
//! It renders as member-access syntax (`a.b[2]["user-name"]`), with the
//! synthetic call/construct markers appended verbatim for diagnostics.

use std::fmt::{self, Write};
use std::sync::Arc;

use crate::model::{PropertyKey, Symbol};

/// Marker appended for the result of a synchronous call
pub const CALL_RESULT_MARKER: &str = "[sync-result]";

/// Marker appended for a constructed instance
pub const CONSTRUCTED_MARKER: &str = "[constructed]";

/// One step of a path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Property read: name, index or symbol
    Key(PropertyKey),
    /// Value returned by a synchronous call
    CallResult,
    /// Instance produced by a construction
    Constructed,
}

impl From<PropertyKey> for Segment {
    fn from(key: PropertyKey) -> Self {
        Segment::Key(key)
    }
}

impl From<&PropertyKey> for Segment {
    fn from(key: &PropertyKey) -> Self {
        Segment::Key(key.clone())
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Key(PropertyKey::from(name))
    }
}

impl From<u32> for Segment {
    fn from(index: u32) -> Self {
        Segment::Key(PropertyKey::Index(index))
    }
}

impl From<Symbol> for Segment {
    fn from(symbol: Symbol) -> Self {
        Segment::Key(PropertyKey::Symbol(symbol))
    }
}

struct PathNode {
    parent: Path,
    segment: Segment,
    len: usize,
}

/// Immutable route from the root; children share their parent's nodes
#[derive(Clone, Default)]
pub struct Path(Option<Arc<PathNode>>);

impl Path {
    /// The empty path
    pub fn root() -> Self {
        Self(None)
    }

    /// This path with one segment appended
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        Self(Some(Arc::new(PathNode {
            parent: self.clone(),
            segment: segment.into(),
            len: self.len() + 1,
        })))
    }

    pub fn call_result(&self) -> Self {
        self.child(Segment::CallResult)
    }

    pub fn constructed(&self) -> Self {
        self.child(Segment::Constructed)
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.as_ref().map(|node| &node.segment)
    }

    pub fn parent(&self) -> Option<&Path> {
        self.0.as_ref().map(|node| &node.parent)
    }

    /// Segments from the root outwards
    pub fn segments(&self) -> Vec<&Segment> {
        let mut segments = Vec::with_capacity(self.len());
        let mut cursor = self;
        while let Some(node) = &cursor.0 {
            segments.push(&node.segment);
            cursor = &node.parent;
        }
        segments.reverse();
        segments
    }

    /// Accessor string for this path
    ///
    /// Pure and total: identical paths always render identically.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (position, segment) in self.segments().into_iter().enumerate() {
            push_segment(&mut out, position, segment);
        }
        out
    }
}

fn push_segment(out: &mut String, position: usize, segment: &Segment) {
    match segment {
        Segment::Key(PropertyKey::String(name)) if is_identifier(name) => {
            if position > 0 {
                out.push('.');
            }
            out.push_str(name);
        }
        Segment::Key(PropertyKey::String(name)) => {
            let _ = write!(out, "[{}]", quote(name));
        }
        Segment::Key(PropertyKey::Index(index)) => {
            let _ = write!(out, "[{index}]");
        }
        Segment::Key(PropertyKey::Symbol(symbol)) => match symbol.registered_key() {
            Some(key) => {
                let _ = write!(out, "[Symbol.for({})]", quote(key));
            }
            None => {
                let _ = write!(out, "[{}]", symbol.description().unwrap_or("Symbol()"));
            }
        },
        Segment::CallResult => out.push_str(CALL_RESULT_MARKER),
        Segment::Constructed => out.push_str(CONSTRUCTED_MARKER),
    }
}

/// `^[A-Za-z_$][A-Za-z0-9_$]*$`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Double-quoted string literal with JSON escaping
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

impl<S: Into<Segment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter().fold(Path::root(), |path, segment| path.child(segment))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.render())
    }
}
