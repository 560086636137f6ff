//! Settlement tracking for deferred call results
//!
//! Attaches an observer-only continuation to a deferred returned by a
//! wrapped call and reports `apply:resolved` / `apply:rejected` once it
//! settles. The deferred itself is handed back to the caller untouched.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::event::{Event, EventKind};
use crate::model::{Deferred, Object, Settlement, Value};
use crate::path::Path;
use crate::session::SessionCore;
use crate::stats::Counters;

/// Start tracking `deferred`, produced by calling `target` at `path`
///
/// Inside a tokio runtime the report runs on a spawned task that watches
/// the deferred without owning it; otherwise it runs as a settlement
/// continuation on whichever thread settles the deferred. Either way an
/// abandoned pending deferred releases everything the report captured.
pub(crate) fn track(
    session: &Arc<SessionCore>,
    deferred: &Deferred,
    target: &Object,
    path: Path,
    args: &[Value],
) {
    Counters::bump(&session.counters().settlements_tracked);

    let session = Arc::clone(session);
    let target = target.clone();
    let args = args.to_vec();
    let report = move |settlement: &Settlement| {
        let event = match settlement {
            Ok(value) => Event::new(session.id(), EventKind::ApplyResolved, &target, path)
                .with_args(&args)
                .with_result(value),
            Err(reason) => Event::new(session.id(), EventKind::ApplyRejected, &target, path)
                .with_args(&args)
                .with_error(reason),
        };
        tracing::debug!(kind = %event.kind, accessor = %event.accessor(), "Deferred result settled");
        session.emit(event.deferred());
    };

    match Handle::try_current() {
        Ok(handle) => {
            let watch = deferred.subscribe();
            handle.spawn(async move {
                match watch.settled().await {
                    Some(settlement) => report(&settlement),
                    None => tracing::trace!("Deferred dropped while pending; nothing to report"),
                }
            });
        }
        Err(_) => deferred.on_settle(report),
    }
}
