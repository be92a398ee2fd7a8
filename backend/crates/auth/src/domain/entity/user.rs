//! User Entity
//!
//! One account type for candidates, companies and admins; the role decides
//! which workflow actions are available.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{email::Email, user_role::UserRole, user_status::UserStatus};
use crate::error::{AuthError, AuthResult};

const DISPLAY_NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lower-cased
    pub email: Email,
    pub display_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Candidate skills, used for job matching
    pub skills: Vec<String>,
    /// Only meaningful for company accounts
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, display_name: impl Into<String>, role: UserRole) -> AuthResult<Self> {
        let now = Utc::now();
        Ok(Self {
            user_id: UserId::new(),
            email,
            display_name: validate_display_name(display_name.into())?,
            role,
            status: UserStatus::default(),
            skills: Vec::new(),
            company_name: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.can_sign_in()
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) -> AuthResult<()> {
        self.display_name = validate_display_name(name.into())?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_skills(&mut self, skills: Vec<String>) {
        self.skills = skills;
        self.updated_at = Utc::now();
    }

    pub fn set_company_name(&mut self, name: Option<String>) {
        self.company_name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

fn validate_display_name(name: String) -> AuthResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AuthError::validation("displayName", "Display name cannot be empty"));
    }
    if name.chars().count() > DISPLAY_NAME_MAX {
        return Err(AuthError::validation(
            "displayName",
            format!("Display name must be at most {} characters", DISPLAY_NAME_MAX),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new("ana@example.com").unwrap()
    }

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(email(), "  Ana ", UserRole::Candidate).unwrap();
        assert_eq!(user.display_name, "Ana");
        assert!(user.is_active());
        assert!(user.skills.is_empty());
    }

    #[test]
    fn test_blank_display_name_rejected() {
        assert!(User::new(email(), "   ", UserRole::Candidate).is_err());
    }

    #[test]
    fn test_company_name_blank_clears() {
        let mut user = User::new(email(), "Acme HR", UserRole::Company).unwrap();
        user.set_company_name(Some("Acme".into()));
        assert_eq!(user.company_name.as_deref(), Some("Acme"));
        user.set_company_name(Some("  ".into()));
        assert_eq!(user.company_name, None);
    }
}
