//! Scripted fakes for the step client and the audit sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

use crate::audit::AuditSink;
use crate::client::{StepCall, StepClient};
use crate::config::RetryPolicy;
use crate::core::{RecordedEvent, SagaEvent, StepFailure, StepId, StepPayload, StepResult};
use crate::errors::AuditError;

/// A step client that replays scripted results and records every call.
///
/// Each scripted result is the terminal result of one invocation: the fake
/// stands in for the whole retry budget, so a scripted failure means "the
/// budget is spent". Unscripted invocations fail loudly; unscripted
/// compensations succeed (deletes are idempotent).
#[derive(Default)]
pub struct ScriptedStepClient {
    invoke_scripts: Mutex<HashMap<StepId, VecDeque<StepResult>>>,
    compensate_scripts: Mutex<HashMap<StepId, VecDeque<Result<(), StepFailure>>>>,
    invocations: Mutex<Vec<(StepId, Value)>>,
    compensations: Mutex<Vec<(StepId, String, Value)>>,
}

impl ScriptedStepClient {
    /// Creates a client with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a result for the next invocation of a step.
    pub fn script_invoke(&self, step: StepId, result: StepResult) {
        self.invoke_scripts
            .lock()
            .entry(step)
            .or_default()
            .push_back(result);
    }

    /// Queues a successful invocation with the given payload.
    pub fn script_invoke_success(&self, step: StepId, payload: StepPayload) {
        self.script_invoke(step, Ok(payload));
    }

    /// Queues a terminal invocation failure.
    pub fn script_invoke_failure(&self, step: StepId, error: impl Into<String>, attempts: u32) {
        self.script_invoke(step, Err(StepFailure::new(error, attempts)));
    }

    /// Queues a compensation failure for a step.
    pub fn script_compensate_failure(&self, step: StepId, error: impl Into<String>) {
        self.compensate_scripts
            .lock()
            .entry(step)
            .or_default()
            .push_back(Err(StepFailure::new(error, 1)));
    }

    /// Recorded forward invocations: step and payload, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<(StepId, Value)> {
        self.invocations.lock().clone()
    }

    /// Steps invoked forward, in call order.
    #[must_use]
    pub fn invoked_steps(&self) -> Vec<StepId> {
        self.invocations.lock().iter().map(|(step, _)| *step).collect()
    }

    /// Recorded compensations: endpoint and payload, in call order.
    #[must_use]
    pub fn compensations(&self) -> Vec<(String, Value)> {
        self.compensations
            .lock()
            .iter()
            .map(|(_, endpoint, payload)| (endpoint.clone(), payload.clone()))
            .collect()
    }

    /// Steps compensated, in call order.
    #[must_use]
    pub fn compensated_steps(&self) -> Vec<StepId> {
        self.compensations.lock().iter().map(|(step, ..)| *step).collect()
    }
}

#[async_trait]
impl StepClient for ScriptedStepClient {
    async fn invoke(&self, call: StepCall, _retry: &RetryPolicy) -> StepResult {
        self.invocations
            .lock()
            .push((call.step, call.payload.clone()));

        if let Some(result) = self
            .invoke_scripts
            .lock()
            .get_mut(&call.step)
            .and_then(VecDeque::pop_front)
        {
            return result;
        }
        Err(StepFailure::new(
            format!("no scripted result for service {}", call.step),
            1,
        ))
    }

    async fn compensate(&self, call: StepCall) -> Result<(), StepFailure> {
        self.compensations
            .lock()
            .push((call.step, call.endpoint.clone(), call.payload.clone()));

        if let Some(result) = self
            .compensate_scripts
            .lock()
            .get_mut(&call.step)
            .and_then(VecDeque::pop_front)
        {
            return result;
        }
        Ok(())
    }
}

/// An audit sink that rejects everything, for sink-outage scenarios.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownAuditSink;

#[async_trait]
impl AuditSink for DownAuditSink {
    async fn append(&self, _event: SagaEvent) -> Result<RecordedEvent, AuditError> {
        Err(AuditError::Unavailable("sink is down".to_string()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<RecordedEvent>, AuditError> {
        Err(AuditError::Unavailable("sink is down".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scripted_results_replay_in_order() {
        tokio_test::block_on(async {
            let client = ScriptedStepClient::new();
            client.script_invoke_failure(StepId::A, "first", 3);
            client.script_invoke_success(
                StepId::A,
                StepPayload::new().with_value("user_id", json!(1)),
            );

            let call = || StepCall::invoke(StepId::A, "http://a/invoke", json!({}));
            let policy = RetryPolicy::default();

            assert!(client.invoke(call(), &policy).await.is_err());
            assert!(client.invoke(call(), &policy).await.is_ok());
            assert_eq!(client.invoked_steps(), vec![StepId::A, StepId::A]);
        });
    }

    #[test]
    fn test_unscripted_invoke_fails_loudly() {
        tokio_test::block_on(async {
            let client = ScriptedStepClient::new();
            let call = StepCall::invoke(StepId::B, "http://b/invoke", json!({}));
            let failure = client
                .invoke(call, &RetryPolicy::default())
                .await
                .expect_err("unscripted");
            assert!(failure.error.contains("no scripted result"));
        });
    }

    #[test]
    fn test_unscripted_compensation_succeeds() {
        tokio_test::block_on(async {
            let client = ScriptedStepClient::new();
            let call =
                StepCall::compensation(StepId::A, "http://a/compensate", json!({"user_id": 1}));
            assert!(client.compensate(call).await.is_ok());
            assert_eq!(client.compensated_steps(), vec![StepId::A]);
        });
    }
}
