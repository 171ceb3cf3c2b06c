//! Audit events for committed local writes.

use crate::local::LocalRecord;
use parking_lot::Mutex;

/// Why a local write happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditCause {
    /// The write merged newer remote state during reconciliation.
    Reconciliation,
    /// The write originated from an application call (create, update,
    /// delete).
    Application,
}

/// One committed local write.
///
/// `before` is `None` for inserts, `after` is `None` for deletes. Events for
/// a write that was rolled back are never emitted.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Entity type name.
    pub entity: String,
    /// Local id of the written record.
    pub local_id: u64,
    /// Why the write happened.
    pub cause: AuditCause,
    /// The record before the write.
    pub before: Option<LocalRecord>,
    /// The record after the write.
    pub after: Option<LocalRecord>,
}

/// A consumer of audit events.
pub trait AuditSink: Send + Sync {
    /// Receives one committed write.
    fn record(&self, event: AuditEvent);
}

/// Discards all events. The default sink.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Collects events in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the events received so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of events received so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events were received.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_in_order() {
        let sink = MemoryAuditSink::new();
        assert!(sink.is_empty());

        for local_id in [1, 2] {
            sink.record(AuditEvent {
                entity: "organisation".into(),
                local_id,
                cause: AuditCause::Application,
                before: None,
                after: None,
            });
        }

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].local_id, 1);
        assert_eq!(events[1].local_id, 2);
    }
}
