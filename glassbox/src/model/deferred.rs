//! Deferred values: settle-once results known only later

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::value::Value;

/// Success value or rejection reason
pub type Settlement = Result<Value, Value>;

type Continuation = Box<dyn FnOnce(&Settlement) + Send>;

struct DeferredInner {
    state: watch::Sender<Option<Settlement>>,
    /// Guards registration against settlement; see `on_settle`
    continuations: Mutex<Vec<Continuation>>,
}

/// A value whose success or failure is known only later
///
/// Settles at most once; the first `resolve`/`reject` wins. Any number of
/// consumers may await or subscribe, and each observes the same settlement.
#[derive(Clone)]
pub struct Deferred(Arc<DeferredInner>);

impl Deferred {
    /// Create a pending deferred
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self(Arc::new(DeferredInner {
            state,
            continuations: Mutex::new(Vec::new()),
        }))
    }

    pub fn resolved(value: impl Into<Value>) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    pub fn rejected(reason: impl Into<Value>) -> Self {
        let deferred = Self::new();
        deferred.reject(reason);
        deferred
    }

    /// Settle successfully; `false` if already settled
    pub fn resolve(&self, value: impl Into<Value>) -> bool {
        self.settle(Ok(value.into()))
    }

    /// Settle with a failure; `false` if already settled
    pub fn reject(&self, reason: impl Into<Value>) -> bool {
        self.settle(Err(reason.into()))
    }

    fn settle(&self, settlement: Settlement) -> bool {
        let pending = {
            let mut continuations = self.0.continuations.lock();
            let changed = self.0.state.send_if_modified(|state| {
                if state.is_some() {
                    return false;
                }
                *state = Some(settlement.clone());
                true
            });
            if !changed {
                return false;
            }
            std::mem::take(&mut *continuations)
        };

        for continuation in pending {
            continuation(&settlement);
        }
        true
    }

    /// Current settlement, if any
    pub fn peek(&self) -> Option<Settlement> {
        self.0.state.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.0.state.borrow().is_some()
    }

    /// Run `f` once the deferred settles
    ///
    /// Runs immediately when already settled, otherwise on the settling thread.
    pub fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(&Settlement) + Send + 'static,
    {
        let current = {
            let mut continuations = self.0.continuations.lock();
            let current = self.peek();
            if current.is_none() {
                continuations.push(Box::new(f));
                return;
            }
            current
        };
        if let Some(settlement) = current {
            f(&settlement);
        }
    }

    /// Wait for settlement without consuming it
    pub async fn settled(&self) -> Settlement {
        self.subscribe()
            .settled()
            .await
            .unwrap_or_else(|| Err(Value::from("deferred dropped before settling")))
    }

    /// Watch for settlement without holding the deferred alive
    pub fn subscribe(&self) -> SettlementWatch {
        SettlementWatch(self.0.state.subscribe())
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Non-owning view of a [`Deferred`]'s settlement
///
/// Created by [`Deferred::subscribe`]. Once every `Deferred` handle is gone
/// a pending watch can never settle, and `settled` yields `None`.
pub struct SettlementWatch(watch::Receiver<Option<Settlement>>);

impl SettlementWatch {
    pub async fn settled(mut self) -> Option<Settlement> {
        loop {
            let current = self.0.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if self.0.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            None => write!(f, "[Deferred pending]"),
            Some(Ok(v)) => write!(f, "[Deferred resolved {v:?}]"),
            Some(Err(e)) => write!(f, "[Deferred rejected {e:?}]"),
        }
    }
}
