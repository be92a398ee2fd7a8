use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Candidate,
    Company,
    Admin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::Candidate => "candidate",
            UserRole::Company => "company",
            UserRole::Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Companies and admins review applications
    #[inline]
    pub const fn can_review(&self) -> bool {
        matches!(self, UserRole::Company | UserRole::Admin)
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "candidate" => Some(UserRole::Candidate),
            "company" => Some(UserRole::Company),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_code() {
        assert_eq!(UserRole::from_code("candidate"), Some(UserRole::Candidate));
        assert_eq!(UserRole::from_code("company"), Some(UserRole::Company));
        assert_eq!(UserRole::from_code("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_code("moderator"), None);
    }

    #[test]
    fn test_user_role_checks() {
        assert!(!UserRole::Candidate.can_review());
        assert!(UserRole::Company.can_review());
        assert!(UserRole::Admin.can_review());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Company.is_admin());
    }
}
