//! Infrastructure Layer

pub mod memory;
pub mod postgres;

pub use memory::MemoryPaymentRepository;
pub use postgres::PgPaymentRepository;
