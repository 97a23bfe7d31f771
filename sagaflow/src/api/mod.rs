//! HTTP surface of the coordinator.
//!
//! Two endpoints: `POST /start` runs one saga to a terminal state and
//! `GET /logs` lists the most recent audit events, newest first. The start
//! endpoint always attempts a structured JSON body describing the saga id,
//! final status and, on failure, the failing step and error; a plain-text
//! 500 is the last resort when even that body cannot be serialized.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::audit::{AuditSink, MemoryAuditSink};
use crate::client::{HttpStepClient, StepClient};
use crate::config::SagaConfig;
use crate::core::SagaOutcome;
use crate::errors::SagaflowError;
use crate::saga::{SagaCoordinator, SagaRequest};

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 500;

struct AppState {
    coordinator: SagaCoordinator,
    sink: Arc<dyn AuditSink>,
}

/// Builds the production app: HTTP step client and in-memory audit sink.
pub fn build_app(config: SagaConfig) -> Result<Router, SagaflowError> {
    let client = Arc::new(HttpStepClient::new(config.timeout())?);
    let sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
    Ok(build_app_with(client, sink, config))
}

/// Builds the app over explicit collaborators.
#[must_use]
pub fn build_app_with(
    client: Arc<dyn StepClient>,
    sink: Arc<dyn AuditSink>,
    config: SagaConfig,
) -> Router {
    let coordinator = SagaCoordinator::new(client, Arc::clone(&sink), config);
    let state = Arc::new(AppState { coordinator, sink });

    Router::new()
        .route("/start", post(start_saga))
        .route("/logs", get(list_logs))
        .layer(Extension(state))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /start
///
/// Body: `{username, address, payment}`. Returns 200 on success, 500 with a
/// structured body after a rollback or a hard failure, 400 for invalid
/// input.
async fn start_saga(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SagaRequest>,
) -> Response {
    match state.coordinator.start(&request).await {
        Ok(outcome) if outcome.is_success() => respond_json(
            StatusCode::OK,
            &json!({ "saga": outcome.saga_id, "status": "success" }),
        ),
        Ok(outcome) => respond_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &rolled_back_body(&outcome),
        ),
        Err(SagaflowError::InvalidRequest(message)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_request", message)
        }
        Err(SagaflowError::AuditUnavailable { saga_id }) => respond_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({
                "saga": saga_id,
                "status": "failed",
                "error": "audit sink unavailable; no saga event could be recorded",
            }),
        ),
        Err(error) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            error.to_string(),
        ),
    }
}

/// GET /logs?limit=N
///
/// Most recent audit events, newest first. `limit` defaults to 50 and is
/// capped at 500.
async fn list_logs(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let limit = clamp_limit(query.limit);
    match state.sink.recent(limit).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(error) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "audit_unavailable",
            format!("failed to query audit events: {error}"),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON helpers
// ─────────────────────────────────────────────────────────────────────────────

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT)
}

fn rolled_back_body(outcome: &SagaOutcome) -> Value {
    let mut body = json!({
        "saga": outcome.saga_id,
        "status": outcome.status,
    });
    if let Some(step) = outcome.failed_step {
        body["failed_service"] = json!(step);
    }
    if let Some(key) = outcome.correlation_key {
        body["user_id"] = json!(key);
    }
    if let Some(error) = &outcome.error {
        body["error"] = json!(error);
    }
    body
}

fn respond_json(status: StatusCode, body: &Value) -> Response {
    match serde_json::to_string(body) {
        Ok(serialized) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            serialized,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("failed to serialize saga response: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "saga finished but the response could not be serialized",
            )
                .into_response()
        }
    }
}

fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": code, "message": message.into() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompensationReport, StepId};
    use uuid::Uuid;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(10_000)), 500);
    }

    #[test]
    fn test_rolled_back_body_shape() {
        let outcome = SagaOutcome::rolled_back(
            Uuid::new_v4(),
            StepId::B,
            "connection refused (attempts: 3)",
            Some(42),
            CompensationReport::default(),
        );

        let body = rolled_back_body(&outcome);
        assert_eq!(body["status"], "rolled_back");
        assert_eq!(body["failed_service"], "B");
        assert_eq!(body["user_id"], 42);
        assert_eq!(body["error"], "connection refused (attempts: 3)");
    }

    #[test]
    fn test_rolled_back_body_without_correlation_key() {
        let outcome = SagaOutcome::rolled_back(
            Uuid::new_v4(),
            StepId::A,
            "connect timeout",
            None,
            CompensationReport::default(),
        );

        let body = rolled_back_body(&outcome);
        assert_eq!(body["failed_service"], "A");
        assert!(body.get("user_id").is_none());
    }
}
