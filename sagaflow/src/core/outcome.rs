//! Step invocation results and the final saga outcome.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::status::{SagaStatus, StepOutcome};
use super::step::StepId;

/// Key/value data returned by a successful step invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPayload {
    data: Map<String, Value>,
}

impl StepPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object.
    #[must_use]
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Looks up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Looks up an integer value.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(Value::as_i64)
    }

    /// Returns true if the payload contains the key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns true if the payload carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Terminal failure of a step invocation, after the retry budget is spent.
///
/// Only the last error encountered is surfaced, together with how many
/// attempts were made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (attempts: {attempts})")]
pub struct StepFailure {
    /// The last error encountered.
    pub error: String,
    /// Total attempts made, including the first.
    pub attempts: u32,
}

impl StepFailure {
    /// Creates a failure from the last error and the attempt count.
    #[must_use]
    pub fn new(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            error: error.into(),
            attempts,
        }
    }
}

/// Result of one step invocation: a success payload or a terminal failure.
pub type StepResult = Result<StepPayload, StepFailure>;

/// Outcome of one compensation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationAction {
    /// The step whose compensation this slot covers.
    pub step: StepId,
    /// Whether the compensation ran, failed, or had nothing to undo.
    pub outcome: StepOutcome,
    /// Human-readable description of what happened.
    pub detail: String,
}

/// Per-step report produced by the compensation pipeline, in processing
/// order (reverse of completion order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationReport {
    /// One entry per compensation slot.
    pub actions: Vec<CompensationAction>,
}

impl CompensationReport {
    /// The outcome recorded for a given step, if the slot was processed.
    #[must_use]
    pub fn outcome_for(&self, step: StepId) -> Option<StepOutcome> {
        self.actions
            .iter()
            .find(|action| action.step == step)
            .map(|action| action.outcome)
    }

    /// Returns true if every attempted compensation succeeded.
    #[must_use]
    pub fn fully_compensated(&self) -> bool {
        self.actions
            .iter()
            .all(|action| action.outcome != StepOutcome::Failed)
    }
}

/// The terminal result of one saga execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SagaOutcome {
    /// The saga's unique identifier.
    pub saga_id: Uuid,
    /// Terminal status: `Succeeded` or `RolledBack`.
    pub status: SagaStatus,
    /// The step whose failure triggered the rollback.
    pub failed_step: Option<StepId>,
    /// The error that triggered the rollback.
    pub error: Option<String>,
    /// The correlation key, when step A produced one.
    pub correlation_key: Option<i64>,
    /// The compensation report, when a rollback ran.
    pub compensation: Option<CompensationReport>,
}

impl SagaOutcome {
    /// Outcome of a saga whose forward steps all completed.
    #[must_use]
    pub fn succeeded(saga_id: Uuid) -> Self {
        Self {
            saga_id,
            status: SagaStatus::Succeeded,
            failed_step: None,
            error: None,
            correlation_key: None,
            compensation: None,
        }
    }

    /// Outcome of a saga that failed forward and was rolled back.
    #[must_use]
    pub fn rolled_back(
        saga_id: Uuid,
        failed_step: StepId,
        error: impl Into<String>,
        correlation_key: Option<i64>,
        compensation: CompensationReport,
    ) -> Self {
        Self {
            saga_id,
            status: SagaStatus::RolledBack,
            failed_step: Some(failed_step),
            error: Some(error.into()),
            correlation_key,
            compensation: Some(compensation),
        }
    }

    /// Returns true if all forward steps completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SagaStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_payload_lookup() {
        let payload = StepPayload::new()
            .with_value("status", json!("success"))
            .with_value("user_id", json!(42));

        assert_eq!(payload.get_i64("user_id"), Some(42));
        assert_eq!(payload.get("status"), Some(&json!("success")));
        assert!(payload.contains("status"));
        assert!(!payload.contains("missing"));
        assert_eq!(payload.get_i64("status"), None);
    }

    #[test]
    fn test_step_payload_from_object() {
        let value = json!({"status": "success", "user_id": 7});
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        let payload = StepPayload::from_map(map);
        assert_eq!(payload.get_i64("user_id"), Some(7));
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_step_failure_display() {
        let failure = StepFailure::new("connection refused", 3);
        assert_eq!(failure.to_string(), "connection refused (attempts: 3)");
    }

    #[test]
    fn test_compensation_report_lookup() {
        let report = CompensationReport {
            actions: vec![
                CompensationAction {
                    step: StepId::C,
                    outcome: StepOutcome::Skipped,
                    detail: "never completed".to_string(),
                },
                CompensationAction {
                    step: StepId::A,
                    outcome: StepOutcome::Success,
                    detail: "rolled back".to_string(),
                },
            ],
        };

        assert_eq!(report.outcome_for(StepId::C), Some(StepOutcome::Skipped));
        assert_eq!(report.outcome_for(StepId::A), Some(StepOutcome::Success));
        assert_eq!(report.outcome_for(StepId::B), None);
        assert!(report.fully_compensated());
    }

    #[test]
    fn test_compensation_report_partial() {
        let report = CompensationReport {
            actions: vec![CompensationAction {
                step: StepId::B,
                outcome: StepOutcome::Failed,
                detail: "delete failed".to_string(),
            }],
        };
        assert!(!report.fully_compensated());
    }

    #[test]
    fn test_saga_outcome_factories() {
        let saga_id = Uuid::new_v4();

        let success = SagaOutcome::succeeded(saga_id);
        assert!(success.is_success());
        assert_eq!(success.failed_step, None);

        let rolled_back = SagaOutcome::rolled_back(
            saga_id,
            StepId::B,
            "boom",
            Some(42),
            CompensationReport::default(),
        );
        assert!(!rolled_back.is_success());
        assert_eq!(rolled_back.status, SagaStatus::RolledBack);
        assert_eq!(rolled_back.failed_step, Some(StepId::B));
        assert_eq!(rolled_back.correlation_key, Some(42));
    }
}
