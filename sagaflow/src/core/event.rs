//! Audit event types for the saga trail.
//!
//! A [`SagaEvent`] is the draft built by the coordinator; the audit sink
//! assigns the timestamp and sequence number at write time and hands back a
//! [`RecordedEvent`]. Recorded events are never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::StepOutcome;
use super::step::{EventStep, StepId};

/// One saga transition, ready to be appended to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaEvent {
    /// The saga this event belongs to.
    pub saga_id: Uuid,
    /// Which step, compensation, or summary the event describes.
    pub step: EventStep,
    /// How that step turned out.
    pub outcome: StepOutcome,
    /// Human-readable description of the transition.
    pub detail: String,
}

impl SagaEvent {
    /// Creates an event with explicit fields.
    #[must_use]
    pub fn new(
        saga_id: Uuid,
        step: EventStep,
        outcome: StepOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            saga_id,
            step,
            outcome,
            detail: detail.into(),
        }
    }

    /// A forward step completed.
    #[must_use]
    pub fn step_succeeded(saga_id: Uuid, step: StepId, detail: impl Into<String>) -> Self {
        Self::new(saga_id, EventStep::forward(step), StepOutcome::Success, detail)
    }

    /// A forward step exhausted its retry budget.
    #[must_use]
    pub fn step_failed(saga_id: Uuid, step: StepId, detail: impl Into<String>) -> Self {
        Self::new(saga_id, EventStep::forward(step), StepOutcome::Failed, detail)
    }

    /// A compensating action completed.
    #[must_use]
    pub fn compensation_succeeded(saga_id: Uuid, step: StepId, detail: impl Into<String>) -> Self {
        Self::new(
            saga_id,
            EventStep::compensation(step),
            StepOutcome::Success,
            detail,
        )
    }

    /// A compensating action failed.
    #[must_use]
    pub fn compensation_failed(saga_id: Uuid, step: StepId, detail: impl Into<String>) -> Self {
        Self::new(
            saga_id,
            EventStep::compensation(step),
            StepOutcome::Failed,
            detail,
        )
    }

    /// A compensating action had nothing to undo.
    #[must_use]
    pub fn compensation_skipped(saga_id: Uuid, step: StepId, detail: impl Into<String>) -> Self {
        Self::new(
            saga_id,
            EventStep::compensation(step),
            StepOutcome::Skipped,
            detail,
        )
    }

    /// The rollback summary written after all compensation slots ran.
    #[must_use]
    pub fn rollback(saga_id: Uuid, outcome: StepOutcome, detail: impl Into<String>) -> Self {
        Self::new(saga_id, EventStep::Rollback, outcome, detail)
    }
}

/// An event persisted in the audit trail, stamped at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Position in the sink's total append order.
    pub sequence: u64,
    /// The saga this event belongs to.
    pub saga_id: Uuid,
    /// Which step, compensation, or summary the event describes.
    pub step: EventStep,
    /// How that step turned out.
    pub outcome: StepOutcome,
    /// Human-readable description of the transition.
    pub detail: String,
    /// When the sink accepted the event.
    pub timestamp: DateTime<Utc>,
}

impl RecordedEvent {
    /// Stamps a draft event with its write-time metadata.
    #[must_use]
    pub fn from_draft(event: SagaEvent, sequence: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            sequence,
            saga_id: event.saga_id,
            step: event.step,
            outcome: event.outcome,
            detail: event.detail,
            timestamp,
        }
    }
}
