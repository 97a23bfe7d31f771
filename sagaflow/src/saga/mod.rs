//! Saga execution: instance state machine, coordinator, and compensation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{SagaState, SagaStatus, StepId};
use crate::errors::SagaflowError;

mod compensation;
mod coordinator;

pub use compensation::CompensationPipeline;
pub use coordinator::SagaCoordinator;

#[cfg(test)]
mod integration_tests;

/// The business request that starts one saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaRequest {
    /// Username for the user record created by step A.
    pub username: String,
    /// Address attached by step B.
    pub address: String,
    /// Payment method attached by step C.
    pub payment: String,
}

impl SagaRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        address: impl Into<String>,
        payment: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            address: address.into(),
            payment: payment.into(),
        }
    }

    /// Rejects requests with empty required fields, before any step runs.
    pub fn validate(&self) -> Result<(), SagaflowError> {
        for (field, value) in [
            ("username", &self.username),
            ("address", &self.address),
            ("payment", &self.payment),
        ] {
            if value.trim().is_empty() {
                return Err(SagaflowError::InvalidRequest(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// One execution of the pipeline. Created at the start of a request and
/// discarded after the response; never persisted as a resumable entity.
#[derive(Debug, Clone)]
pub struct SagaInstance {
    /// Unique identifier correlating all audit events of this execution.
    pub id: Uuid,
    /// Value produced by step A, required by later steps and compensations.
    /// Set exactly once, immediately after step A succeeds.
    pub correlation_key: Option<i64>,
    /// Steps that have succeeded so far, in completion order. Append-only
    /// during the forward phase, read-only during compensation.
    pub completed_steps: Vec<StepId>,
    /// Current state-machine position.
    pub state: SagaState,
}

impl SagaInstance {
    /// Creates a fresh instance with a new saga id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_key: None,
            completed_steps: Vec::new(),
            state: SagaState::NotStarted,
        }
    }

    /// Starts the forward phase.
    pub fn begin(&mut self) {
        if self.state == SagaState::NotStarted {
            self.state = SagaState::StepA;
        }
    }

    /// The step currently being attempted, if the forward phase is active.
    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        match self.state {
            SagaState::StepA => Some(StepId::A),
            SagaState::StepB => Some(StepId::B),
            SagaState::StepC => Some(StepId::C),
            _ => None,
        }
    }

    /// Sets the correlation key; later writes are ignored.
    pub fn set_correlation_key(&mut self, key: i64) {
        if self.correlation_key.is_none() {
            self.correlation_key = Some(key);
        }
    }

    /// Marks the current step completed and advances the machine.
    pub fn record_completion(&mut self, step: StepId) {
        self.completed_steps.push(step);
        self.state = match step {
            StepId::A => SagaState::StepB,
            StepId::B => SagaState::StepC,
            StepId::C => SagaState::Succeeded,
        };
    }

    /// Drops out of the forward phase into compensation.
    pub fn begin_compensation(&mut self) {
        self.state = SagaState::Compensating;
    }

    /// Marks the rollback complete.
    pub fn finish_rolled_back(&mut self) {
        self.state = SagaState::RolledBack;
    }

    /// The externally visible status.
    #[must_use]
    pub fn status(&self) -> SagaStatus {
        self.state.status()
    }
}

impl Default for SagaInstance {
    fn default() -> Self {
        Self::new()
    }
}
