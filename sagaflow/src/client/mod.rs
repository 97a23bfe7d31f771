//! Remote step invocation.
//!
//! The coordinator talks to step services through the [`StepClient`] trait,
//! so tests can inject scripted fakes in place of the HTTP implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RetryPolicy;
use crate::core::{StepFailure, StepId, StepResult};

mod http;

pub use http::HttpStepClient;

/// One outbound call to a step service.
#[derive(Debug, Clone)]
pub struct StepCall {
    /// The step the call targets.
    pub step: StepId,
    /// Target URL.
    pub endpoint: String,
    /// JSON request body.
    pub payload: Value,
    /// Response fields required for the call to count as successful.
    pub required_fields: &'static [&'static str],
}

impl StepCall {
    /// Builds a forward invocation call; the required response fields are
    /// derived from the step.
    #[must_use]
    pub fn invoke(step: StepId, endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            step,
            endpoint: endpoint.into(),
            payload,
            required_fields: step.required_response_fields(),
        }
    }

    /// Builds a compensation call; compensations require no response fields.
    #[must_use]
    pub fn compensation(step: StepId, endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            step,
            endpoint: endpoint.into(),
            payload,
            required_fields: &[],
        }
    }
}

/// Performs remote step invocations and compensations.
#[async_trait]
pub trait StepClient: Send + Sync {
    /// Invokes a forward step with the given retry budget.
    ///
    /// Makes up to `max_retries + 1` attempts, waiting the policy's fixed
    /// delay between attempts. Only the last error is surfaced, with the
    /// number of attempts made.
    async fn invoke(&self, call: StepCall, retry: &RetryPolicy) -> StepResult;

    /// Invokes a compensating action, exactly once. No retry: compensation
    /// favors visibility over additional risk of side effects.
    async fn compensate(&self, call: StepCall) -> Result<(), StepFailure>;
}
