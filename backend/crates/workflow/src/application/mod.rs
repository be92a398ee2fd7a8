//! Application Layer - Use Cases

pub mod applications;
pub mod assessment;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod documents;
pub mod jobs;
pub mod manager;

pub use applications::{
    ListApplicationsUseCase, SubmitApplicationUseCase, ensure_can_review, ensure_can_view,
};
pub use assessment::{AssessmentUseCase, StartedAssessment};
pub use cache::{JobCaches, JobStats};
pub use checkout::{
    ConfirmPaymentUseCase, ConfirmedPayment, StartPaymentUseCase, ensure_payment_due,
};
pub use config::WorkflowConfig;
pub use documents::{DocumentContext, DocumentService, expected_documents};
pub use jobs::{
    CreateJobUseCase, JobMatchesUseCase, JobStatsUseCase, ListJobsUseCase, UpdateJobUseCase,
};
pub use manager::WorkflowManager;
