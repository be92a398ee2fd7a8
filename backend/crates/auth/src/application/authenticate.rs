//! Authenticate Use Case
//!
//! Resolves a bearer token to a live user. The token only proves identity;
//! the user record is loaded on every call so disabling an account takes
//! effect immediately.

use std::sync::Arc;

use kernel::id::UserId;
use platform::token::BearerToken;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct AuthenticateUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> AuthenticateUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, token: &str) -> AuthResult<User> {
        let claims = BearerToken::verify(token, &self.config.token_secret)?;
        let user_id = UserId::from_uuid(claims.user_id);

        let user = self
            .repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }
}
