use azcopilot_core::{ExecutionResult, ExecutionStatus, Operation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use uuid::Uuid;

/// One terminal transition of a planned action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    /// Position of the action in its batch.
    pub sequence: usize,
    pub operation: Operation,
    pub status: ExecutionStatus,
    pub dry_run: bool,
    pub detail: String,
}

impl AuditEvent {
    pub fn from_result(sequence: usize, result: &ExecutionResult) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            sequence,
            operation: result.action.operation,
            status: result.status,
            dry_run: result.action.is_dry_run,
            detail: result.detail.clone(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured `tracing` record.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match event.status {
            ExecutionStatus::Failed => tracing::warn!(
                event_id = %event.event_id,
                sequence = event.sequence,
                operation = %event.operation,
                status = %event.status,
                dry_run = event.dry_run,
                detail = %event.detail,
                "action failed"
            ),
            _ => tracing::info!(
                event_id = %event.event_id,
                sequence = event.sequence,
                operation = %event.operation,
                status = %event.status,
                dry_run = event.dry_run,
                detail = %event.detail,
                "action finished"
            ),
        }
    }
}

/// Keeps events in memory, e.g. for `--json` output or assertions.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}
