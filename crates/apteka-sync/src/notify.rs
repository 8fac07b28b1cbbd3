//! # Sync Event Notification
//!
//! Outbound events for UIs and operators: one on every completed visible
//! run, one on every failed one. Delivery is fire-and-forget by contract;
//! an implementation must never block the sync path or surface an error
//! into it.

use serde_json::Value;
use tracing::info;

/// Emitted when a full sync or a push ingestion completes.
pub const EVENT_SYNC_COMPLETED: &str = "sync_completed";

/// Emitted when a visible run fails.
pub const EVENT_SYNC_ERROR: &str = "sync_error";

/// Sink for sync lifecycle events.
pub trait SyncNotifier: Send + Sync {
    fn notify(&self, event: &str, payload: Value);
}

/// Discards all events. Useful for tests and headless embedding.
pub struct NoopNotifier;

impl SyncNotifier for NoopNotifier {
    fn notify(&self, _event: &str, _payload: Value) {}
}

/// Writes events into the log stream. The daemon's default sink.
pub struct TracingNotifier;

impl SyncNotifier for TracingNotifier {
    fn notify(&self, event: &str, payload: Value) {
        info!(event, %payload, "Sync event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sinks_accept_events() {
        // Neither sink may panic or block on any payload.
        NoopNotifier.notify(EVENT_SYNC_COMPLETED, json!({"totalPages": 3}));
        TracingNotifier.notify(EVENT_SYNC_ERROR, json!({"error": "timeout"}));
    }
}
