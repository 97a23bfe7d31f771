//! HTTP step client on reqwest.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{StepCall, StepClient};
use crate::config::RetryPolicy;
use crate::core::{StepFailure, StepPayload, StepResult};
use crate::errors::SagaflowError;

/// Step client that POSTs JSON to the step services.
///
/// An attempt fails on a transport error, a timeout, a non-2xx status, a
/// body that is not a JSON object, a `status` field other than `"success"`,
/// or a missing required field. A service dying mid-request looks exactly
/// like an error response; there is no special casing.
pub struct HttpStepClient {
    http: reqwest::Client,
}

impl HttpStepClient {
    /// Creates a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, SagaflowError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SagaflowError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    async fn attempt(&self, call: &StepCall) -> Result<StepPayload, String> {
        let response = self
            .http
            .post(&call.endpoint)
            .json(&call.payload)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {e}", call.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} returned {status}", call.endpoint));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON from {}: {e}", call.endpoint))?;

        parse_step_response(&body, call.required_fields)
            .map_err(|e| format!("{} {e}", call.endpoint))
    }
}

/// Validates a 2xx response body against the step service contract.
///
/// A response that parses but is missing a required field (e.g. no
/// correlation key from step A) is a logic failure equivalent to a
/// transport failure, never silently accepted.
fn parse_step_response(
    body: &Value,
    required_fields: &[&str],
) -> Result<StepPayload, String> {
    let Value::Object(object) = body else {
        return Err("response body is not a JSON object".to_string());
    };

    match object.get("status").and_then(Value::as_str) {
        Some("success") => {}
        Some(other) => return Err(format!("response status is {other:?}")),
        None => return Err("response carries no status field".to_string()),
    }

    for field in required_fields {
        if !object.contains_key(*field) {
            return Err(format!("response is missing required field {field:?}"));
        }
    }

    Ok(StepPayload::from_map(object.clone()))
}

#[async_trait]
impl StepClient for HttpStepClient {
    async fn invoke(&self, call: StepCall, retry: &RetryPolicy) -> StepResult {
        let attempts = retry.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.attempt(&call).await {
                Ok(payload) => return Ok(payload),
                Err(error) => {
                    tracing::warn!(
                        step = %call.step,
                        endpoint = %call.endpoint,
                        attempt,
                        "step attempt failed: {error}"
                    );
                    last_error = error;
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay()).await;
                    }
                }
            }
        }

        Err(StepFailure::new(last_error, attempts))
    }

    async fn compensate(&self, call: StepCall) -> Result<(), StepFailure> {
        match self.attempt(&call).await {
            Ok(_) => Ok(()),
            Err(error) => Err(StepFailure::new(error, 1)),
        }
    }
}
