//! Forward pipeline driver.

use serde_json::json;
use std::sync::Arc;

use super::{CompensationPipeline, SagaInstance, SagaRequest};
use crate::audit::{AuditRecorder, AuditSink};
use crate::client::{StepCall, StepClient};
use crate::config::SagaConfig;
use crate::core::{SagaEvent, SagaOutcome, StepId};
use crate::errors::SagaflowError;

const CORRELATION_FIELD: &str = "user_id";

/// Drives one saga at a time through the fixed A -> B -> C pipeline.
///
/// Steps run strictly sequentially within a saga; the coordinator itself is
/// shared across concurrent requests and holds no per-saga state.
pub struct SagaCoordinator {
    client: Arc<dyn StepClient>,
    sink: Arc<dyn AuditSink>,
    config: SagaConfig,
}

impl SagaCoordinator {
    /// Creates a coordinator over a step client and an audit sink.
    #[must_use]
    pub fn new(client: Arc<dyn StepClient>, sink: Arc<dyn AuditSink>, config: SagaConfig) -> Self {
        Self {
            client,
            sink,
            config,
        }
    }

    /// Runs one saga to a terminal state.
    ///
    /// Every invocation reaches exactly one terminal state. Returns the
    /// structured outcome, or an error only when the request is invalid or
    /// when not a single audit event could be recorded.
    pub async fn start(&self, request: &SagaRequest) -> Result<SagaOutcome, SagaflowError> {
        request.validate()?;

        let recorder = AuditRecorder::new(Arc::clone(&self.sink));
        let mut saga = SagaInstance::new();
        saga.begin();
        tracing::info!(saga_id = %saga.id, "saga started");

        let mut failure: Option<(StepId, String)> = None;

        while let Some(step) = saga.current_step() {
            let call = self.forward_call(step, request, &saga);
            match self.client.invoke(call, &self.config.retry).await {
                Ok(payload) => {
                    let detail = match step {
                        StepId::A => match payload.get_i64(CORRELATION_FIELD) {
                            Some(key) => {
                                saga.set_correlation_key(key);
                                format!("User {key} created")
                            }
                            None => {
                                let error = format!(
                                    "service A response carried a non-numeric {CORRELATION_FIELD}"
                                );
                                recorder
                                    .record(SagaEvent::step_failed(saga.id, step, &error))
                                    .await;
                                failure = Some((step, error));
                                saga.begin_compensation();
                                continue;
                            }
                        },
                        StepId::B => "Address added".to_string(),
                        StepId::C => "Payment added".to_string(),
                    };
                    recorder
                        .record(SagaEvent::step_succeeded(saga.id, step, detail))
                        .await;
                    saga.record_completion(step);
                }
                Err(step_failure) => {
                    let error = step_failure.to_string();
                    tracing::warn!(saga_id = %saga.id, step = %step, "step failed: {error}");
                    recorder
                        .record(SagaEvent::step_failed(
                            saga.id,
                            step,
                            format!("service {step} failed: {error}"),
                        ))
                        .await;
                    failure = Some((step, error));
                    saga.begin_compensation();
                }
            }
        }

        let outcome = if let Some((failed_step, error)) = failure {
            tracing::warn!(saga_id = %saga.id, step = %failed_step, "rolling back");
            let pipeline =
                CompensationPipeline::new(self.client.as_ref(), &recorder, &self.config);
            let report = pipeline
                .run(
                    saga.id,
                    saga.correlation_key,
                    &saga.completed_steps,
                    failed_step,
                    &error,
                )
                .await;
            saga.finish_rolled_back();
            SagaOutcome::rolled_back(saga.id, failed_step, error, saga.correlation_key, report)
        } else {
            tracing::info!(saga_id = %saga.id, "saga succeeded");
            SagaOutcome::succeeded(saga.id)
        };

        if recorder.recorded() == 0 {
            return Err(SagaflowError::AuditUnavailable { saga_id: saga.id });
        }
        Ok(outcome)
    }

    fn forward_call(&self, step: StepId, request: &SagaRequest, saga: &SagaInstance) -> StepCall {
        let payload = match step {
            StepId::A => json!({ "username": request.username }),
            StepId::B => json!({
                "user_id": saga.correlation_key,
                "address": request.address,
            }),
            StepId::C => json!({
                "user_id": saga.correlation_key,
                "payment_method": request.payment,
            }),
        };
        StepCall::invoke(step, self.config.endpoint(step).invoke_url.clone(), payload)
    }
}
