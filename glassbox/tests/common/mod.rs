//! Shared helpers for integration tests

#![allow(dead_code)]

use glassbox::{EventLog, Value};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness; `RUST_LOG` selects levels
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Read `key` through whatever object `value` holds
pub fn get(value: &Value, key: &str) -> Value {
    value
        .as_object()
        .expect("value is not an object")
        .get(key)
        .expect("read failed")
}

/// Read a dotted path one segment at a time
pub fn get_path(value: &Value, dotted: &str) -> Value {
    dotted.split('.').fold(value.clone(), |current, key| get(&current, key))
}

/// Yield until `log` holds at least `count` events
pub async fn wait_for_events(log: &EventLog, count: usize) {
    for _ in 0..200 {
        if log.len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} events, saw {:?}", log.trail());
}

/// Let pending tasks run so late events would show up
pub async fn settle_scheduler() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
