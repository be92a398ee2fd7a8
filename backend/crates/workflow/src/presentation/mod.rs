//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors and router.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod router;

pub use extract::{EXAM_SESSION_HEADER, ExamSessionHeader, RequestClient};
pub use handlers::WorkflowAppState;
pub use router::workflow_router;
