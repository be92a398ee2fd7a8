//! Relocation Workflow
//!
//! Applications move through a payment-gated state machine:
//! `pending -> accepted -> assessment_pending -> assessment_completed ->
//! documents_pending -> offer_sent -> offer_accepted -> visa_processing ->
//! completed`, with `rejected` reachable from any non-terminal status.
//!
//! - Whether a paid step is unlocked is derived from payment records, never
//!   stored
//! - Each transition is a single versioned write; a lost race is a 409
//! - Documents are generated idempotently per (application, kind)
//! - Jobs, skill matching and per-job statistics with read-through caches
//!
//! Layout: `domain/`, `application/`, `infra/`, `presentation/`, plus
//! `backend` which names the store types for one deployment.

pub mod application;
pub mod backend;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

pub use application::{JobCaches, WorkflowConfig, WorkflowManager};
pub use backend::{Backend, MemoryBackend, PgBackend, Services};
pub use domain::{
    Application, ApplicationRepository, ApplicationStatus, DocumentKind, Job, JobRepository,
    PaymentGates, PaymentState, WorkflowStep,
};
pub use error::{WorkflowError, WorkflowResult};
pub use presentation::{WorkflowAppState, workflow_router};
