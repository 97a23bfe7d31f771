//! Configuration for the coordinator: step endpoints, retry policy, and
//! server settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::StepId;

/// Retry policy for forward step invocations.
///
/// The policy is deliberately simple and deterministic: a fixed number of
/// retries with a constant delay between attempts. Compensating actions
/// never retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit values.
    #[must_use]
    pub fn new(max_retries: u32, retry_delay_ms: u64) -> Self {
        Self {
            max_retries,
            retry_delay_ms,
        }
    }

    /// Sets the retry count.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the inter-attempt delay.
    #[must_use]
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Total attempts allowed, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// The inter-attempt delay as a `Duration`.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Network addresses of one step service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEndpoint {
    /// Forward invocation URL.
    pub invoke_url: String,
    /// Compensation (delete-by-correlation-key) URL.
    pub compensate_url: String,
}

impl StepEndpoint {
    /// Creates an endpoint pair.
    #[must_use]
    pub fn new(invoke_url: impl Into<String>, compensate_url: impl Into<String>) -> Self {
        Self {
            invoke_url: invoke_url.into(),
            compensate_url: compensate_url.into(),
        }
    }

    fn localhost(port: u16) -> Self {
        Self::new(
            format!("http://localhost:{port}/invoke"),
            format!("http://localhost:{port}/compensate"),
        )
    }
}

/// Configuration for one coordinator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaConfig {
    /// Step A service (creates the user, produces the correlation key).
    #[serde(default = "default_step_a")]
    pub step_a: StepEndpoint,
    /// Step B service (attaches the address).
    #[serde(default = "default_step_b")]
    pub step_b: StepEndpoint,
    /// Step C service (attaches the payment method).
    #[serde(default = "default_step_c")]
    pub step_c: StepEndpoint,
    /// Retry policy for forward invocations.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Address the HTTP surface binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_step_a() -> StepEndpoint {
    StepEndpoint::localhost(5001)
}

fn default_step_b() -> StepEndpoint {
    StepEndpoint::localhost(5002)
}

fn default_step_c() -> StepEndpoint {
    StepEndpoint::localhost(5003)
}

fn default_timeout_seconds() -> f64 {
    5.0
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            step_a: default_step_a(),
            step_b: default_step_b(),
            step_c: default_step_c(),
            retry: RetryPolicy::default(),
            timeout_seconds: default_timeout_seconds(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl SagaConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint pair for one step.
    #[must_use]
    pub fn with_endpoint(mut self, step: StepId, endpoint: StepEndpoint) -> Self {
        match step {
            StepId::A => self.step_a = endpoint,
            StepId::B => self.step_b = endpoint,
            StepId::C => self.step_c = endpoint,
        }
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The endpoint pair for one step.
    #[must_use]
    pub fn endpoint(&self, step: StepId) -> &StepEndpoint {
        match step {
            StepId::A => &self.step_a,
            StepId::B => &self.step_b,
            StepId::C => &self.step_c,
        }
    }

    /// The per-request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    /// Builds a configuration from `SAGAFLOW_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let urls = [
            ("SAGAFLOW_STEP_A_INVOKE_URL", &mut config.step_a.invoke_url),
            (
                "SAGAFLOW_STEP_A_COMPENSATE_URL",
                &mut config.step_a.compensate_url,
            ),
            ("SAGAFLOW_STEP_B_INVOKE_URL", &mut config.step_b.invoke_url),
            (
                "SAGAFLOW_STEP_B_COMPENSATE_URL",
                &mut config.step_b.compensate_url,
            ),
            ("SAGAFLOW_STEP_C_INVOKE_URL", &mut config.step_c.invoke_url),
            (
                "SAGAFLOW_STEP_C_COMPENSATE_URL",
                &mut config.step_c.compensate_url,
            ),
        ];
        for (key, slot) in urls {
            if let Ok(value) = std::env::var(key) {
                *slot = value;
            }
        }

        if let Some(value) = env_parse("SAGAFLOW_MAX_RETRIES") {
            config.retry.max_retries = value;
        }
        if let Some(value) = env_parse("SAGAFLOW_RETRY_DELAY_MS") {
            config.retry.retry_delay_ms = value;
        }
        if let Some(value) = env_parse("SAGAFLOW_TIMEOUT_SECONDS") {
            config.timeout_seconds = value;
        }
        if let Ok(value) = std::env::var("SAGAFLOW_BIND_ADDR") {
            config.bind_addr = value;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparseable {key}={raw}");
            None
        }
    }
}
