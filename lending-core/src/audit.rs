//! Audit sink collaborator
//!
//! One event per successful operation, dispatched fire-and-forget. A
//! sink must never fail the operation that produced the event; the
//! tracing-backed sink only logs, and the in-memory sink backs tests.

use crate::types::MemberId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// A loan was opened
    LoanOpened,
    /// A loan was returned
    LoanReturned,
    /// A fine was paid
    FinePaid,
    /// Stock was adjusted
    Restocked,
    /// A title was added to the catalog
    TitleAdded,
}

/// One audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event id (UUIDv7)
    pub id: Uuid,

    /// Action performed
    pub action: AuditAction,

    /// Member involved, if any
    pub member_id: Option<MemberId>,

    /// Loan involved, if any
    pub loan_id: Option<Uuid>,

    /// Human-readable detail
    pub detail: String,

    /// When the action completed
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped with `at`
    pub fn new(
        action: AuditAction,
        member_id: Option<MemberId>,
        loan_id: Option<Uuid>,
        detail: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            action,
            member_id,
            loan_id,
            detail: detail.into(),
            at,
        }
    }
}

/// Audit sink consumed by the core, fire-and-forget
pub trait AuditSink: Send + Sync {
    /// Record one event; must not fail the calling operation
    fn record(&self, event: AuditEvent);
}

/// Sink that forwards events to the `audit` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            action = ?event.action,
            member = ?event.member_id,
            loan = ?event.loan_id,
            at = %event.at,
            "{}",
            event.detail
        );
    }
}

/// In-memory sink for tests
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
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
    fn test_memory_sink_records_in_order() {
        let sink = MemoryAuditSink::new();
        let now = Utc::now();

        sink.record(AuditEvent::new(
            AuditAction::LoanOpened,
            Some(MemberId::new("M001")),
            None,
            "borrowed BK001 at CB01",
            now,
        ));
        sink.record(AuditEvent::new(
            AuditAction::LoanReturned,
            Some(MemberId::new("M001")),
            None,
            "returned BK001",
            now,
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::LoanOpened);
        assert_eq!(events[1].action, AuditAction::LoanReturned);
    }
}
