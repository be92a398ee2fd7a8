//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
pub mod issue_token;
pub mod manage_users;
pub mod profile;

// Re-exports
pub use authenticate::AuthenticateUseCase;
pub use config::AuthConfig;
pub use issue_token::{IssueTokenUseCase, IssuedToken};
pub use manage_users::{ListUsersUseCase, SetUserStatusUseCase};
pub use profile::{UpdateProfileInput, UpdateProfileUseCase};
