//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::AuthResult;

/// Filter for admin listings
#[derive(Debug, Clone, Copy, Default)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub limit: i64,
    pub offset: i64,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user. A taken email is `AuthError::EmailTaken`.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Newest first
    async fn list(&self, query: UserQuery) -> AuthResult<Vec<User>>;
}
