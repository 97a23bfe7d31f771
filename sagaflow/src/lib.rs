//! # Sagaflow
//!
//! A saga coordinator for one multi-step business transaction spread across
//! independent services. The fixed pipeline A -> B -> C is driven step by
//! step over HTTP with a bounded, fixed-delay retry budget per step; on the
//! first failure, completed steps are undone by compensating actions in
//! strict reverse order, and every transition is appended to an immutable
//! audit trail.
//!
//! - **Step sequencing**: one saga runs strictly sequentially; step B is
//!   never attempted before step A's success is confirmed.
//! - **Compensation**: best-effort and non-transactional; a failed cleanup
//!   is recorded and never stops the remaining compensations.
//! - **Audit trail**: append-only, stamped at write time, totally ordered
//!   per saga.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sagaflow::prelude::*;
//!
//! let config = SagaConfig::from_env();
//! let app = sagaflow::api::build_app(config)?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod audit;
pub mod client;
pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod saga;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditRecorder, AuditSink, MemoryAuditSink};
    pub use crate::client::{HttpStepClient, StepCall, StepClient};
    pub use crate::config::{RetryPolicy, SagaConfig, StepEndpoint};
    pub use crate::core::{
        CompensationReport, EventStep, RecordedEvent, SagaEvent, SagaOutcome, SagaState,
        SagaStatus, StepFailure, StepId, StepOutcome, StepPayload, StepResult,
    };
    pub use crate::errors::{AuditError, SagaflowError};
    pub use crate::saga::{CompensationPipeline, SagaCoordinator, SagaInstance, SagaRequest};
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
