//! Skill list normalisation
//!
//! Skills are free-form labels compared case-insensitively. The stored list
//! keeps the first spelling a user gave and drops later duplicates.

use crate::error::{AuthError, AuthResult};

pub const MAX_SKILLS: usize = 50;
pub const MAX_SKILL_LEN: usize = 64;

pub fn normalize_skills<I, S>(raw: I) -> AuthResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for skill in raw {
        let skill = skill.as_ref().trim();
        if skill.is_empty() {
            continue;
        }
        if skill.chars().count() > MAX_SKILL_LEN {
            return Err(AuthError::validation(
                "skills",
                format!("Each skill must be at most {} characters", MAX_SKILL_LEN),
            ));
        }
        if !out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            out.push(skill.to_string());
        }
    }
    if out.len() > MAX_SKILLS {
        return Err(AuthError::validation(
            "skills",
            format!("At most {} skills are allowed", MAX_SKILLS),
        ));
    }
    Ok(out)
}
