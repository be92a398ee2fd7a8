//! Infrastructure Layer

pub mod memory;
pub mod postgres;

pub use memory::{MemoryApplicationRepository, MemoryJobRepository};
pub use postgres::{PgApplicationRepository, PgJobRepository};
