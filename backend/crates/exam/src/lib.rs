//! Exam Security Manager
//!
//! Proctoring state for online assessments:
//! - Sessions are bound to the browser fingerprint captured at start
//! - Violations are counted per severity; reaching a ceiling terminates
//! - Termination is one-way and idempotent
//! - Sessions live in a shared keyed store with a hard expiry, so every
//!   API instance sees the same state

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

#[cfg(test)]
mod tests;

pub use application::{ExamConfig, ExamSecurityManager, StartedSession};
pub use domain::{
    ExamSession, ExamSessionRepository, SessionCheck, Severity, SeverityCounts, Thresholds,
    Violation, ViolationKind, ViolationOutcome,
};
pub use error::{ExamError, ExamResult};
pub use infra::{MemoryExamSessionRepository, PgExamSessionRepository};
