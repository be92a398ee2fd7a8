//! Payment Gateway
//!
//! Crypto-denominated fees for the paid workflow steps:
//! - USD fee per step, converted at the rate in force when the payment is
//!   created; the quoted amount never changes afterwards
//! - At most one pending or confirmed payment per (application, step)
//! - 24h expiry; a lapsed payment frees its slot
//! - Settlement is reported by a `ChainVerifier`
//!
//! Layout follows the other bounded contexts: `domain/`, `application/`,
//! `infra/`.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;


pub use application::{
    CreatePaymentInput, CreatePaymentUseCase, ExpireStalePaymentsUseCase, FailPaymentUseCase,
    ListPaymentsUseCase, PaymentConfig, PaymentHistoryUseCase, VerifyOutcome,
    VerifyPaymentUseCase,
};
pub use domain::{
    ChainObservation, ChainVerifier, Currency, ExchangeRates, FeeSchedule, Payment,
    PaymentRepository, PaymentStatus, ShapeCheckVerifier, StaticExchangeRates,
};
pub use error::{PaymentError, PaymentResult};
pub use infra::{MemoryPaymentRepository, PgPaymentRepository};
