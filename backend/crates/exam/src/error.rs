//! Exam Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type ExamResult<T> = Result<T, ExamError>;

#[derive(Debug, Error)]
pub enum ExamError {
    /// Unknown or expired session id
    #[error("Exam session not found or expired")]
    SessionNotFound,

    #[error("Exam session belongs to another user")]
    Forbidden,

    #[error("Exam session has been terminated")]
    SessionTerminated,

    /// Request does not come from the browser that started the session
    #[error("Exam session could not be validated for this client")]
    ClientMismatch,

    /// Another writer updated the session between read and save
    #[error("Exam session was modified concurrently")]
    ConcurrentModification,

    #[error("{0}")]
    Validation(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExamError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExamError::SessionNotFound => ErrorKind::NotFound,
            ExamError::Forbidden | ExamError::SessionTerminated | ExamError::ClientMismatch => {
                ErrorKind::Forbidden
            }
            ExamError::ConcurrentModification => ErrorKind::Conflict,
            ExamError::Validation(_) => ErrorKind::UnprocessableEntity,
            ExamError::MissingHeader(_) => ErrorKind::BadRequest,
            ExamError::Database(_) | ExamError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            ExamError::ConcurrentModification => err.with_action("Retry the request"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            ExamError::Database(e) => {
                tracing::error!(error = %e, "Exam database error");
            }
            ExamError::Internal(msg) => {
                tracing::error!(message = %msg, "Exam internal error");
            }
            ExamError::SessionTerminated => {
                tracing::warn!("Request on terminated exam session");
            }
            ExamError::ClientMismatch => {
                tracing::warn!("Exam session used from a different client");
            }
            _ => {
                tracing::debug!(error = %self, "Exam error");
            }
        }
    }
}

impl IntoResponse for ExamError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::client::FingerprintError> for ExamError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                ExamError::MissingHeader(header)
            }
        }
    }
}
