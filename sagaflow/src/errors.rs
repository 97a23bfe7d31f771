//! Error types for the sagaflow coordinator.
//!
//! Step and compensation failures are not errors at this level: they are
//! converted into audit events and a structured outcome. Only conditions
//! that prevent producing a structured outcome at all live here.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for coordinator operations.
#[derive(Debug, Error)]
pub enum SagaflowError {
    /// The incoming request is missing or has empty required fields.
    /// Rejected before any step runs; no audit event is written.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The audit sink was unreachable for the entire saga: not a single
    /// event could be recorded, so no trustworthy outcome exists.
    #[error("audit sink unavailable: saga {saga_id} could not record any event")]
    AuditUnavailable {
        /// The saga that failed to leave a trail.
        saga_id: Uuid,
    },

    /// A component could not be constructed or wired.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Audit sink operation error.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink could not be reached.
    #[error("audit sink unreachable: {0}")]
    Unavailable(String),

    /// The event was rejected by the sink.
    #[error("invalid append: {0}")]
    InvalidAppend(String),
}
