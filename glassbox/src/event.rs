//! Interaction events reported to observers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::model::{Object, PropertyKey, Value};
use crate::path::Path;

/// Kind of observed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "apply")]
    Apply,
    #[serde(rename = "construct")]
    Construct,
    #[serde(rename = "deleteProperty")]
    DeleteProperty,
    #[serde(rename = "apply:resolved")]
    ApplyResolved,
    #[serde(rename = "apply:rejected")]
    ApplyRejected,
}

impl EventKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Get => "get",
            EventKind::Set => "set",
            EventKind::Apply => "apply",
            EventKind::Construct => "construct",
            EventKind::DeleteProperty => "deleteProperty",
            EventKind::ApplyResolved => "apply:resolved",
            EventKind::ApplyRejected => "apply:rejected",
        }
    }

    /// Whether this reports the later settlement of a deferred result
    pub fn is_settlement(&self) -> bool {
        matches!(self, EventKind::ApplyResolved | EventKind::ApplyRejected)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(EventKind::Get),
            "set" => Ok(EventKind::Set),
            "apply" => Ok(EventKind::Apply),
            "construct" => Ok(EventKind::Construct),
            "deleteProperty" => Ok(EventKind::DeleteProperty),
            "apply:resolved" => Ok(EventKind::ApplyResolved),
            "apply:rejected" => Ok(EventKind::ApplyRejected),
            _ => Err(format!("Unknown event kind: {}", s)),
        }
    }
}

/// One observed operation
///
/// `target`, `value` and `result` hold what the underlying operation saw and
/// produced, never the wrappers handed back to the caller.
#[derive(Debug, Clone)]
pub struct Event {
    /// Unique identifier for this event
    pub event_id: Uuid,

    /// Instrumentation session that produced the event
    pub session_id: Uuid,

    /// Operation kind
    pub kind: EventKind,

    /// When the operation was observed
    pub timestamp: DateTime<Utc>,

    /// Unwrapped object the operation ran against
    pub target: Object,

    /// Route from the root; for keyed operations it ends with the key
    pub path: Path,

    /// Property involved, for get/set/deleteProperty
    pub key: Option<PropertyKey>,

    /// Arguments, for apply/construct
    pub args: Option<Vec<Value>>,

    /// Value written, for set
    pub value: Option<Value>,

    /// Value produced, for get/apply/construct and settlements
    pub result: Option<Value>,

    /// Whether the result settles later
    pub is_deferred: bool,

    /// Thrown value or rejection reason
    pub error: Option<Value>,
}

impl Event {
    pub(crate) fn new(session_id: Uuid, kind: EventKind, target: &Object, path: Path) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            session_id,
            kind,
            timestamp: Utc::now(),
            target: target.clone(),
            path,
            key: None,
            args: None,
            value: None,
            result: None,
            is_deferred: false,
            error: None,
        }
    }

    pub(crate) fn with_key(mut self, key: &PropertyKey) -> Self {
        self.key = Some(key.clone());
        self
    }

    pub(crate) fn with_args(mut self, args: &[Value]) -> Self {
        self.args = Some(args.to_vec());
        self
    }

    pub(crate) fn with_value(mut self, value: &Value) -> Self {
        self.value = Some(value.clone());
        self
    }

    pub(crate) fn with_result(mut self, result: &Value) -> Self {
        self.is_deferred = result.is_deferred();
        self.result = Some(result.clone());
        self
    }

    pub(crate) fn with_error(mut self, error: &Value) -> Self {
        self.error = Some(error.clone());
        self
    }

    pub(crate) fn deferred(mut self) -> Self {
        self.is_deferred = true;
        self
    }

    /// Rendered accessor, computed on demand
    pub fn accessor(&self) -> String {
        self.path.render()
    }

    /// Serializable digest for logs and exports
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event_id: self.event_id,
            session_id: self.session_id,
            kind: self.kind,
            timestamp: self.timestamp,
            accessor: self.accessor(),
            key: self.key.as_ref().map(|key| Path::root().child(key).render()),
            args: self.args.as_ref().map(|args| args.iter().map(Value::to_json).collect()),
            value: self.value.as_ref().map(Value::to_json),
            result: self.result.as_ref().map(Value::to_json),
            is_deferred: self.is_deferred,
            error: self.error.as_ref().map(|e| JsonValue::String(e.to_string())),
        }
    }
}

/// JSON-friendly view of an [`Event`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub session_id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub accessor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    pub is_deferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
}
