//! Update Profile Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{skills::normalize_skills, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Fields left as `None` are unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub display_name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub company_name: Option<String>,
}

pub struct UpdateProfileUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> UpdateProfileUseCase<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId, input: UpdateProfileInput) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = input.display_name {
            user.set_display_name(name)?;
        }
        if let Some(skills) = input.skills {
            user.set_skills(normalize_skills(skills)?);
        }
        if let Some(company) = input.company_name {
            if user.role != UserRole::Company {
                return Err(AuthError::validation(
                    "companyName",
                    "Only company accounts have a company name",
                ));
            }
            user.set_company_name(Some(company));
        }

        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Profile updated");

        Ok(user)
    }
}
