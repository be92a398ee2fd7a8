//! Infrastructure Layer
//!
//! Database implementations and an in-memory store for tests and
//! single-node development runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;
