//! Saga status and outcome enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The externally visible status of a saga execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    /// The saga is still executing forward steps or compensations.
    Running,
    /// All forward steps completed.
    Succeeded,
    /// A forward step failed and compensation ran to completion.
    RolledBack,
    /// The saga could not record any outcome at all.
    Failed,
}

impl SagaStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack | Self::Failed)
    }
}

impl fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::RolledBack => write!(f, "rolled_back"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The internal state machine driving one saga execution.
///
/// Forward states name the step currently being attempted. The machine
/// advances `NotStarted -> StepA -> StepB -> StepC -> Succeeded` on the happy
/// path, or drops into `Compensating -> RolledBack` on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    /// No step has been attempted yet.
    NotStarted,
    /// Step A is being attempted.
    StepA,
    /// Step B is being attempted.
    StepB,
    /// Step C is being attempted.
    StepC,
    /// The compensation pipeline is running.
    Compensating,
    /// All forward steps completed.
    Succeeded,
    /// Compensation ran to completion after a forward failure.
    RolledBack,
}

impl SagaState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack)
    }

    /// Maps the state onto the externally visible status.
    #[must_use]
    pub fn status(&self) -> SagaStatus {
        match self {
            Self::Succeeded => SagaStatus::Succeeded,
            Self::RolledBack => SagaStatus::RolledBack,
            _ => SagaStatus::Running,
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::StepA => write!(f, "step_a"),
            Self::StepB => write!(f, "step_b"),
            Self::StepC => write!(f, "step_c"),
            Self::Compensating => write!(f, "compensating"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// The outcome recorded for one audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step or compensation completed.
    Success,
    /// The step or compensation failed.
    Failed,
    /// The compensation had nothing to undo and was never invoked.
    Skipped,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}
