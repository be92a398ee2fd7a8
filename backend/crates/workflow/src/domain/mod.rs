//! Domain Layer

pub mod application;
pub mod document;
pub mod gates;
pub mod job;
pub mod notification;
pub mod repository;
pub mod status;

pub use application::{Application, AssessmentOutcome, AssessmentRecord, AssessmentSecurity};
pub use document::{DocumentGenerator, DocumentKind, DocumentRequest, StorageKeyGenerator};
pub use gates::{
    GatePermissions, PaymentGates, PaymentRequirement, PaymentRequirements, PaymentState,
    PaymentStepStatus, derive_payment_state,
};
pub use job::{Job, JobDraft, JobMatch, match_score, rank_jobs};
pub use notification::{LogNotifier, MemoryNotifier, Notification, Notifier};
pub use repository::{ApplicationQuery, ApplicationRepository, JobQuery, JobRepository};
pub use status::{ApplicationStatus, WorkflowStep};
