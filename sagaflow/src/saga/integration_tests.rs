//! End-to-end coordinator tests over scripted step clients.

use pretty_assertions::assert_eq;
use std::sync::Arc;

use crate::audit::{AuditSink, MemoryAuditSink};
use crate::core::{EventStep, SagaStatus, StepId, StepOutcome};
use crate::errors::SagaflowError;
use crate::saga::{SagaCoordinator, SagaRequest};
use crate::testing::fixtures::{fast_config, sample_request, success_payload};
use crate::testing::mocks::{DownAuditSink, ScriptedStepClient};

struct Harness {
    client: Arc<ScriptedStepClient>,
    sink: Arc<MemoryAuditSink>,
    coordinator: SagaCoordinator,
}

fn harness() -> Harness {
    let client = Arc::new(ScriptedStepClient::new());
    let sink = Arc::new(MemoryAuditSink::new());
    let coordinator = SagaCoordinator::new(
        Arc::clone(&client) as Arc<dyn crate::client::StepClient>,
        Arc::clone(&sink) as Arc<dyn AuditSink>,
        fast_config(),
    );
    Harness {
        client,
        sink,
        coordinator,
    }
}

fn script_success(client: &ScriptedStepClient, step: StepId) {
    client.script_invoke_success(step, success_payload(step, 42));
}

#[tokio::test]
async fn all_steps_succeed() {
    let h = harness();
    for step in StepId::FORWARD_ORDER {
        script_success(&h.client, step);
    }

    let outcome = h.coordinator.start(&sample_request()).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.status, SagaStatus::Succeeded);
    assert_eq!(outcome.failed_step, None);
    assert_eq!(outcome.compensation, None);

    // Exactly three success events, in order A, B, C; no compensation events.
    let events = h.sink.events_for(outcome.saga_id);
    assert_eq!(events.len(), 3);
    let steps: Vec<EventStep> = events.iter().map(|e| e.step).collect();
    assert_eq!(steps, vec![EventStep::A, EventStep::B, EventStep::C]);
    assert!(events.iter().all(|e| e.outcome == StepOutcome::Success));
    assert!(events.iter().all(|e| !e.step.is_compensation()));
}

#[tokio::test]
async fn step_b_failure_rolls_back_only_step_a() {
    let h = harness();
    script_success(&h.client, StepId::A);
    h.client
        .script_invoke_failure(StepId::B, "connection refused", 3);

    let outcome = h.coordinator.start(&sample_request()).await.unwrap();

    assert_eq!(outcome.status, SagaStatus::RolledBack);
    assert_eq!(outcome.failed_step, Some(StepId::B));
    assert_eq!(outcome.correlation_key, Some(42));
    let report = outcome.compensation.unwrap();
    assert_eq!(report.outcome_for(StepId::C), Some(StepOutcome::Skipped));
    assert_eq!(report.outcome_for(StepId::B), Some(StepOutcome::Skipped));
    assert_eq!(report.outcome_for(StepId::A), Some(StepOutcome::Success));

    // Step C was never attempted forward; only A was compensated.
    assert_eq!(h.client.invoked_steps(), vec![StepId::A, StepId::B]);
    assert_eq!(h.client.compensated_steps(), vec![StepId::A]);

    // Trail: A success, B failed, compensate_c/b skipped, compensate_a
    // success, rollback summary.
    let events = h.sink.events_for(outcome.saga_id);
    let trail: Vec<(EventStep, StepOutcome)> =
        events.iter().map(|e| (e.step, e.outcome)).collect();
    assert_eq!(
        trail,
        vec![
            (EventStep::A, StepOutcome::Success),
            (EventStep::B, StepOutcome::Failed),
            (EventStep::CompensateC, StepOutcome::Skipped),
            (EventStep::CompensateB, StepOutcome::Skipped),
            (EventStep::CompensateA, StepOutcome::Success),
            (EventStep::Rollback, StepOutcome::Success),
        ]
    );

    // The failed event surfaces the exhausted retry budget.
    assert!(events[1].detail.contains("attempts: 3"));
}

#[tokio::test]
async fn step_c_failure_compensates_b_and_a() {
    let h = harness();
    script_success(&h.client, StepId::A);
    script_success(&h.client, StepId::B);
    h.client.script_invoke_failure(StepId::C, "504 timeout", 3);

    let outcome = h.coordinator.start(&sample_request()).await.unwrap();

    assert_eq!(outcome.status, SagaStatus::RolledBack);
    assert_eq!(outcome.failed_step, Some(StepId::C));
    let report = outcome.compensation.unwrap();
    assert_eq!(report.outcome_for(StepId::C), Some(StepOutcome::Skipped));
    assert_eq!(report.outcome_for(StepId::B), Some(StepOutcome::Success));
    assert_eq!(report.outcome_for(StepId::A), Some(StepOutcome::Success));

    // Both completed steps are compensated, B before A.
    assert_eq!(h.client.compensated_steps(), vec![StepId::B, StepId::A]);
}

#[tokio::test]
async fn step_a_failure_skips_every_compensation() {
    let h = harness();
    h.client
        .script_invoke_failure(StepId::A, "connect timeout", 3);

    let outcome = h.coordinator.start(&sample_request()).await.unwrap();

    assert_eq!(outcome.status, SagaStatus::RolledBack);
    assert_eq!(outcome.failed_step, Some(StepId::A));
    assert_eq!(outcome.correlation_key, None);
    let report = outcome.compensation.unwrap();
    for step in StepId::REVERSE_ORDER {
        assert_eq!(report.outcome_for(step), Some(StepOutcome::Skipped));
    }

    // No downstream delete is ever issued without a correlation key.
    assert!(h.client.compensations().is_empty());
    // B and C were never attempted forward.
    assert_eq!(h.client.invoked_steps(), vec![StepId::A]);

    // failed A + three skipped slots + rollback summary.
    assert_eq!(h.sink.events_for(outcome.saga_id).len(), 5);
}

#[tokio::test]
async fn correlation_key_threads_through_later_steps() {
    let h = harness();
    for step in StepId::FORWARD_ORDER {
        script_success(&h.client, step);
    }

    h.coordinator.start(&sample_request()).await.unwrap();

    let invocations = h.client.invocations();
    assert_eq!(invocations[0].1["username"], "alice");
    assert_eq!(invocations[1].1["user_id"], 42);
    assert_eq!(invocations[1].1["address"], "1 Main St");
    assert_eq!(invocations[2].1["user_id"], 42);
    assert_eq!(invocations[2].1["payment_method"], "visa");
}

#[tokio::test]
async fn compensation_failure_still_ends_rolled_back() {
    let h = harness();
    script_success(&h.client, StepId::A);
    h.client.script_invoke_failure(StepId::B, "boom", 3);
    h.client
        .script_compensate_failure(StepId::A, "delete refused");

    let outcome = h.coordinator.start(&sample_request()).await.unwrap();

    // A failed cleanup is recorded, not escalated.
    assert_eq!(outcome.status, SagaStatus::RolledBack);
    let report = outcome.compensation.unwrap();
    assert_eq!(report.outcome_for(StepId::A), Some(StepOutcome::Failed));
    assert!(!report.fully_compensated());

    let events = h.sink.events_for(outcome.saga_id);
    let rollback = events.last().unwrap();
    assert_eq!(rollback.step, EventStep::Rollback);
    assert_eq!(rollback.outcome, StepOutcome::Failed);
}

#[tokio::test]
async fn audit_sink_outage_is_the_one_hard_failure() {
    let client = Arc::new(ScriptedStepClient::new());
    for step in StepId::FORWARD_ORDER {
        script_success(&client, step);
    }
    let coordinator = SagaCoordinator::new(
        Arc::clone(&client) as Arc<dyn crate::client::StepClient>,
        Arc::new(DownAuditSink),
        fast_config(),
    );

    let err = coordinator
        .start(&sample_request())
        .await
        .expect_err("no event could be recorded");

    assert!(matches!(err, SagaflowError::AuditUnavailable { .. }));
}

#[tokio::test]
async fn invalid_request_is_rejected_before_any_step() {
    let h = harness();

    let err = h
        .coordinator
        .start(&SagaRequest::new("", "1 Main St", "visa"))
        .await
        .expect_err("empty username");

    assert!(matches!(err, SagaflowError::InvalidRequest(_)));
    assert!(h.client.invocations().is_empty());
    assert!(h.sink.is_empty());
}

#[tokio::test]
async fn concurrent_sagas_share_one_sink_without_corruption() {
    let sink = Arc::new(MemoryAuditSink::new());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let sink = Arc::clone(&sink);
        handles.push(tokio::spawn(async move {
            let client = Arc::new(ScriptedStepClient::new());
            for step in StepId::FORWARD_ORDER {
                script_success(&client, step);
            }
            let coordinator = SagaCoordinator::new(
                client as Arc<dyn crate::client::StepClient>,
                sink as Arc<dyn AuditSink>,
                fast_config(),
            );
            coordinator.start(&sample_request()).await.unwrap()
        }));
    }

    let mut saga_ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(outcome.is_success());
        saga_ids.push(outcome.saga_id);
    }

    assert_eq!(sink.len(), 12);
    for saga_id in saga_ids {
        let events = sink.events_for(saga_id);
        let steps: Vec<EventStep> = events.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![EventStep::A, EventStep::B, EventStep::C]);
    }
}
