//! Payment Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::PaymentStep;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::currency::Currency;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Error)]
pub enum PaymentError {
    /// No USD fee configured for the step
    #[error("No fee is configured for step {0}")]
    ConfigurationMissing(PaymentStep),

    /// A pending or confirmed payment already exists for (application, step)
    #[error("A payment for step {0} already exists for this application")]
    DuplicatePayment(PaymentStep),

    #[error("Payment not found")]
    NotFound,

    #[error("Payment belongs to another user")]
    Forbidden,

    #[error("Payment has expired")]
    PaymentExpired,

    #[error("Transaction hash is not valid for {0}")]
    InvalidTransactionHash(Currency),

    /// The hash already settled a different payment
    #[error("Transaction hash has already been used")]
    TransactionAlreadyUsed,

    #[error("No exchange rate available for {0}")]
    RateUnavailable(Currency),

    #[error("{0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::ConfigurationMissing(_)
            | PaymentError::Database(_)
            | PaymentError::Internal(_) => ErrorKind::InternalServerError,
            PaymentError::DuplicatePayment(_)
            | PaymentError::TransactionAlreadyUsed
            | PaymentError::InvalidState(_) => ErrorKind::Conflict,
            PaymentError::NotFound => ErrorKind::NotFound,
            PaymentError::Forbidden => ErrorKind::Forbidden,
            PaymentError::PaymentExpired => ErrorKind::Gone,
            PaymentError::InvalidTransactionHash(_) => ErrorKind::UnprocessableEntity,
            PaymentError::RateUnavailable(_) => ErrorKind::ServiceUnavailable,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            PaymentError::InvalidTransactionHash(_) => {
                err.with_field_error("transactionHash", "Expected a hex transaction hash")
            }
            PaymentError::PaymentExpired => err.with_action("Create a new payment for this step"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            PaymentError::Database(e) => {
                tracing::error!(error = %e, "Payment database error");
            }
            PaymentError::ConfigurationMissing(step) => {
                tracing::error!(step = %step, "Payment fee not configured");
            }
            PaymentError::Internal(msg) => {
                tracing::error!(message = %msg, "Payment internal error");
            }
            PaymentError::TransactionAlreadyUsed => {
                tracing::warn!("Transaction hash reuse attempt");
            }
            PaymentError::RateUnavailable(currency) => {
                tracing::warn!(currency = %currency, "Exchange rate unavailable");
            }
            _ => {
                tracing::debug!(error = %self, "Payment error");
            }
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
