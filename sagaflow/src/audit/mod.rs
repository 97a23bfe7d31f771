//! Audit trail: sink trait, in-memory sink, and the recorder.
//!
//! Every saga transition is appended to an [`AuditSink`]. Appends are
//! atomic and independent, so concurrent sagas can share one sink without
//! interleaving corruption. The [`AuditRecorder`] swallows per-event append
//! failures: losing a log line never changes a saga's outcome.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{RecordedEvent, SagaEvent};
use crate::errors::AuditError;

/// Append-only, queryable store for saga events.
///
/// The sink assigns the timestamp and sequence number at write time; stored
/// events are never mutated or deleted.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one event, stamping it at write time.
    async fn append(&self, event: SagaEvent) -> Result<RecordedEvent, AuditError>;

    /// Returns the most recent events, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<RecordedEvent>, AuditError>;
}

/// In-memory audit sink.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// All events for one saga, in write order.
    #[must_use]
    pub fn events_for(&self, saga_id: Uuid) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.saga_id == saga_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, event: SagaEvent) -> Result<RecordedEvent, AuditError> {
        let mut events = self.events.write();
        let sequence = events.len() as u64 + 1;
        let recorded = RecordedEvent::from_draft(event, sequence, Utc::now());
        events.push(recorded.clone());
        Ok(recorded)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RecordedEvent>, AuditError> {
        Ok(self
            .events
            .read()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Records saga events, swallowing sink failures.
///
/// Tracks how many events were durably recorded so the coordinator can tell
/// a lossy trail from no trail at all.
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    recorded: AtomicUsize,
}

impl AuditRecorder {
    /// Creates a recorder over a sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            recorded: AtomicUsize::new(0),
        }
    }

    /// Appends an event; a failed append is logged and dropped.
    pub async fn record(&self, event: SagaEvent) {
        match self.sink.append(event).await {
            Ok(_) => {
                self.recorded.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                tracing::warn!("audit append failed, event dropped: {error}");
            }
        }
    }

    /// Number of events durably recorded through this recorder.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded.load(Ordering::Relaxed)
    }
}
