//! Domain Layer

pub mod chain;
pub mod currency;
pub mod fees;
pub mod payment;
pub mod rates;
pub mod repository;

pub use chain::{ChainObservation, ChainVerifier, ShapeCheckVerifier};
pub use currency::Currency;
pub use fees::{FeeSchedule, quote};
pub use payment::{Payment, PaymentStatus};
pub use rates::{ExchangeRates, StaticExchangeRates};
pub use repository::{PaymentQuery, PaymentRepository};
