//! Workflow Error Types
//!
//! Errors from the auth, payment and exam crates pass through unchanged so
//! their status codes and details survive.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use exam::ExamError;
use kernel::PaymentStep;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use payment::PaymentError;
use thiserror::Error;

use crate::domain::status::ApplicationStatus;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Application not found")]
    ApplicationNotFound,

    #[error("Job not found")]
    JobNotFound,

    #[error("Job is closed to new applications")]
    JobClosed,

    /// One application per (candidate, job)
    #[error("You have already applied to this job")]
    DuplicateApplication,

    #[error("Cannot {action} an application in status {from}")]
    InvalidTransition {
        from: ApplicationStatus,
        action: &'static str,
    },

    /// The step's gate is closed
    #[error("Payment for {0} is required before this step")]
    PaymentRequired(PaymentStep),

    #[error("No payment is due for {0} on this application")]
    PaymentNotDue(PaymentStep),

    /// Another writer advanced the application first
    #[error("Application was modified concurrently")]
    ConcurrentModification,

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Document generation failed: {0}")]
    DocumentGeneration(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Exam(#[from] ExamError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        WorkflowError::Forbidden(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Auth(e) => e.status_code(),
            WorkflowError::Payment(e) => e.status_code(),
            WorkflowError::Exam(e) => e.status_code(),
            _ => StatusCode::from_u16(self.kind().status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::ApplicationNotFound | WorkflowError::JobNotFound => ErrorKind::NotFound,
            WorkflowError::JobClosed
            | WorkflowError::DuplicateApplication
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::PaymentNotDue(_)
            | WorkflowError::ConcurrentModification => ErrorKind::Conflict,
            WorkflowError::PaymentRequired(_) => ErrorKind::PaymentRequired,
            WorkflowError::Forbidden(_) => ErrorKind::Forbidden,
            WorkflowError::Validation { .. } => ErrorKind::UnprocessableEntity,
            WorkflowError::Auth(e) => e.kind(),
            WorkflowError::Payment(e) => e.kind(),
            WorkflowError::Exam(e) => e.kind(),
            WorkflowError::DocumentGeneration(_)
            | WorkflowError::Notification(_)
            | WorkflowError::Database(_)
            | WorkflowError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            WorkflowError::Auth(e) => return e.to_app_error(),
            WorkflowError::Payment(e) => return e.to_app_error(),
            WorkflowError::Exam(e) => return e.to_app_error(),
            _ => {}
        }

        let err = AppError::new(self.kind(), self.to_string());
        match self {
            WorkflowError::Validation { field, message } => {
                err.with_field_error(*field, message.clone())
            }
            WorkflowError::PaymentRequired(step) => {
                err.with_action(format!("Create and verify a {step} payment"))
            }
            WorkflowError::ConcurrentModification => err.with_action("Reload the application and retry"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            WorkflowError::Database(e) => {
                tracing::error!(error = %e, "Workflow database error");
            }
            WorkflowError::Internal(msg) => {
                tracing::error!(message = %msg, "Workflow internal error");
            }
            WorkflowError::DocumentGeneration(msg) | WorkflowError::Notification(msg) => {
                tracing::warn!(message = %msg, "Workflow side effect failed");
            }
            WorkflowError::ConcurrentModification => {
                tracing::warn!("Application write lost a race");
            }
            _ => {
                tracing::debug!(error = %self, "Workflow error");
            }
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        match self {
            WorkflowError::Auth(e) => e.into_response(),
            WorkflowError::Payment(e) => e.into_response(),
            WorkflowError::Exam(e) => e.into_response(),
            other => {
                other.log();
                other.to_app_error().into_response()
            }
        }
    }
}

impl From<AppError> for WorkflowError {
    fn from(err: AppError) -> Self {
        WorkflowError::Internal(err.to_string())
    }
}
