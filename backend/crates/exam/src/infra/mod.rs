//! Infrastructure Layer

pub mod memory;
pub mod postgres;

pub use memory::MemoryExamSessionRepository;
pub use postgres::PgExamSessionRepository;
