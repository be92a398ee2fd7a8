//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types and result aliases
//! - Typed entity IDs shared by every bounded context
//! - The payment step vocabulary (used by both payments and the workflow)
//! - The uniform `{success, message, data}` response envelope
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod response;
pub mod step;

pub use error::app_error::{AppError, AppResult, FieldError, OptionExt, ResultExt};
pub use error::kind::ErrorKind;
pub use response::ApiResponse;
pub use step::PaymentStep;
