//! Admin user management

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::{UserQuery, UserRepository};
use crate::domain::value_object::{user_role::UserRole, user_status::UserStatus};
use crate::error::{AuthError, AuthResult};

pub struct ListUsersUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ListUsersUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        role: Option<UserRole>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AuthResult<Vec<User>> {
        self.repo
            .list(UserQuery {
                role,
                limit: self.config.page_size(limit),
                offset: offset.unwrap_or(0).max(0),
            })
            .await
    }
}

pub struct SetUserStatusUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> SetUserStatusUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor: &User,
        target: &UserId,
        status: UserStatus,
    ) -> AuthResult<User> {
        if actor.user_id == *target {
            return Err(AuthError::Forbidden(
                "Admins cannot change their own status".into(),
            ));
        }

        let mut user = self
            .repo
            .find_by_id(target)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.status != status {
            user.set_status(status);
            self.repo.update(&user).await?;
            tracing::info!(
                admin_id = %actor.user_id,
                user_id = %user.user_id,
                status = %status,
                "User status changed"
            );
        }

        Ok(user)
    }
}
