//! Application Layer

pub mod config;
pub mod manager;

pub use config::ExamConfig;
pub use manager::{ExamSecurityManager, StartedSession};
