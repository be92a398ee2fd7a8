//! Domain Layer

pub mod repository;
pub mod session;
pub mod severity;
pub mod violation;

pub use repository::ExamSessionRepository;
pub use session::{ExamSession, SessionCheck, ViolationOutcome};
pub use severity::{Severity, SeverityCounts, Thresholds};
pub use violation::{Violation, ViolationKind};
