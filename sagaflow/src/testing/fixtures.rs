//! Shared fixtures for saga tests.

use serde_json::json;

use crate::config::{RetryPolicy, SagaConfig};
use crate::core::{StepId, StepPayload};
use crate::saga::SagaRequest;

/// The canonical request used across the test suite.
#[must_use]
pub fn sample_request() -> SagaRequest {
    SagaRequest::new("alice", "1 Main St", "visa")
}

/// A config with zero inter-retry delay so tests run fast.
#[must_use]
pub fn fast_config() -> SagaConfig {
    SagaConfig::new().with_retry(RetryPolicy::new(2, 0))
}

/// A successful step response payload; step A responses carry the user id.
#[must_use]
pub fn success_payload(step: StepId, user_id: i64) -> StepPayload {
    let payload = StepPayload::new().with_value("status", json!("success"));
    match step {
        StepId::A => payload.with_value("user_id", json!(user_id)),
        StepId::B | StepId::C => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_request_is_valid() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_success_payload_shape() {
        let payload = success_payload(StepId::A, 42);
        assert_eq!(payload.get_i64("user_id"), Some(42));

        let payload = success_payload(StepId::B, 42);
        assert!(!payload.contains("user_id"));
    }
}
