//! Reverse-order compensation of completed steps.

use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::client::{StepCall, StepClient};
use crate::config::SagaConfig;
use crate::core::{
    CompensationAction, CompensationReport, SagaEvent, StepId, StepOutcome,
};

/// Walks the compensation slots after a forward failure.
///
/// Every slot is processed in strict reverse of completion order (C before
/// B before A) regardless of which step failed. Steps that never completed
/// are recorded as skipped; completed steps get exactly one compensating
/// call, and a failed compensation never stops the remaining ones. This is
/// best-effort rollback: a partial rollback is an accepted terminal
/// outcome, not retried.
pub struct CompensationPipeline<'a> {
    client: &'a dyn StepClient,
    recorder: &'a AuditRecorder,
    config: &'a SagaConfig,
}

impl<'a> CompensationPipeline<'a> {
    /// Creates a pipeline over the coordinator's collaborators.
    #[must_use]
    pub fn new(
        client: &'a dyn StepClient,
        recorder: &'a AuditRecorder,
        config: &'a SagaConfig,
    ) -> Self {
        Self {
            client,
            recorder,
            config,
        }
    }

    /// Runs all compensation slots and writes the rollback summary event.
    pub async fn run(
        &self,
        saga_id: Uuid,
        correlation_key: Option<i64>,
        completed: &[StepId],
        failed_step: StepId,
        error: &str,
    ) -> CompensationReport {
        let mut actions = Vec::with_capacity(StepId::REVERSE_ORDER.len());

        for step in StepId::REVERSE_ORDER {
            let action = self.run_slot(saga_id, step, correlation_key, completed).await;
            actions.push(action);
        }

        let report = CompensationReport { actions };

        let summary_outcome = if report.fully_compensated() {
            StepOutcome::Success
        } else {
            StepOutcome::Failed
        };
        self.recorder
            .record(SagaEvent::rollback(
                saga_id,
                summary_outcome,
                format!("service {failed_step} failure: {error}"),
            ))
            .await;

        report
    }

    async fn run_slot(
        &self,
        saga_id: Uuid,
        step: StepId,
        correlation_key: Option<i64>,
        completed: &[StepId],
    ) -> CompensationAction {
        if !completed.contains(&step) {
            let detail = format!("service {step} never completed; nothing to undo");
            self.recorder
                .record(SagaEvent::compensation_skipped(saga_id, step, &detail))
                .await;
            return CompensationAction {
                step,
                outcome: StepOutcome::Skipped,
                detail,
            };
        }

        // A completed step implies step A succeeded earlier and set the key,
        // so this branch guards against an impossible state rather than a
        // reachable one. Never fall back to a sentinel key.
        let Some(key) = correlation_key else {
            let detail =
                format!("no correlation key available; cannot roll back service {step}");
            self.recorder
                .record(SagaEvent::compensation_failed(saga_id, step, &detail))
                .await;
            return CompensationAction {
                step,
                outcome: StepOutcome::Failed,
                detail,
            };
        };

        let call = StepCall::compensation(
            step,
            self.config.endpoint(step).compensate_url.clone(),
            json!({ "user_id": key }),
        );

        match self.client.compensate(call).await {
            Ok(()) => {
                let detail = format!("rolled back service {step} data for user {key}");
                self.recorder
                    .record(SagaEvent::compensation_succeeded(saga_id, step, &detail))
                    .await;
                CompensationAction {
                    step,
                    outcome: StepOutcome::Success,
                    detail,
                }
            }
            Err(failure) => {
                tracing::warn!(saga_id = %saga_id, step = %step, "compensation failed: {failure}");
                let detail = format!("compensation for service {step} failed: {failure}");
                self.recorder
                    .record(SagaEvent::compensation_failed(saga_id, step, &detail))
                    .await;
                CompensationAction {
                    step,
                    outcome: StepOutcome::Failed,
                    detail,
                }
            }
        }
    }
}
