//! Issue Token Use Case
//!
//! Credential checks happen outside this service; this is the seam that
//! turns an already-identified active user into a bearer token.

use std::sync::Arc;

use kernel::id::UserId;
use platform::token::BearerToken;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_secs: u64,
}

pub struct IssueTokenUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> IssueTokenUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, user_id: &UserId) -> AuthResult<IssuedToken> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        let ttl = self.config.token_ttl_secs();
        let token = BearerToken::issue(user.user_id.into_uuid(), &self.config.token_secret, ttl);

        tracing::info!(user_id = %user.user_id, role = %user.role, "Issued bearer token");

        Ok(IssuedToken {
            token,
            expires_in_secs: ttl,
        })
    }
}
