//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod create;
pub mod expire;
pub mod fail;
pub mod history;
pub mod verify;

pub use config::PaymentConfig;
pub use create::{CreatePaymentInput, CreatePaymentUseCase};
pub use expire::ExpireStalePaymentsUseCase;
pub use fail::FailPaymentUseCase;
pub use history::{ListPaymentsUseCase, PaymentHistoryUseCase};
pub use verify::{VerifyOutcome, VerifyPaymentUseCase};
