//! Job Entity and matching

use chrono::{DateTime, Utc};
use kernel::id::{ExamId, JobId, UserId};
use serde::Serialize;

use crate::error::{WorkflowError, WorkflowResult};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: JobId,
    /// Owning company account
    pub company_id: UserId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub required_skills: Vec<String>,
    /// Inclusive pass mark, 0..=100
    pub assessment_cutoff_score: i32,
    /// Assessment candidates take for this job
    pub exam_id: ExamId,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a job
#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub required_skills: Vec<String>,
    pub assessment_cutoff_score: i32,
}

impl JobDraft {
    fn validate(self) -> WorkflowResult<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > TITLE_MAX {
            return Err(WorkflowError::validation(
                "title",
                format!("Title must be 1 to {TITLE_MAX} characters"),
            ));
        }
        if self.description.chars().count() > DESCRIPTION_MAX {
            return Err(WorkflowError::validation(
                "description",
                format!("Description must be at most {DESCRIPTION_MAX} characters"),
            ));
        }
        if !(0..=100).contains(&self.assessment_cutoff_score) {
            return Err(WorkflowError::validation(
                "assessmentCutoffScore",
                "Cutoff score must be between 0 and 100",
            ));
        }
        let required_skills = auth::domain::value_object::skills::normalize_skills(
            &self.required_skills,
        )
        .map_err(|_| {
            WorkflowError::validation("requiredSkills", "At most 50 skills of 64 characters")
        })?;

        Ok(Self {
            title,
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            required_skills,
            assessment_cutoff_score: self.assessment_cutoff_score,
        })
    }
}

impl Job {
    pub fn new(company_id: UserId, draft: JobDraft) -> WorkflowResult<Self> {
        let draft = draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            job_id: JobId::new(),
            company_id,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            required_skills: draft.required_skills,
            assessment_cutoff_score: draft.assessment_cutoff_score,
            exam_id: ExamId::new(),
            is_open: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, draft: JobDraft) -> WorkflowResult<()> {
        let draft = draft.validate()?;
        self.title = draft.title;
        self.description = draft.description;
        self.location = draft.location;
        self.required_skills = draft.required_skills;
        self.assessment_cutoff_score = draft.assessment_cutoff_score;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.updated_at = Utc::now();
    }
}

/// Share of the job's required skills the candidate has, 0..=100, rounded
/// down. Case-insensitive. A job without requirements matches everyone.
pub fn match_score(candidate_skills: &[String], required_skills: &[String]) -> u8 {
    if required_skills.is_empty() {
        return 100;
    }
    let have = required_skills
        .iter()
        .filter(|req| {
            candidate_skills
                .iter()
                .any(|skill| skill.trim().eq_ignore_ascii_case(req.trim()))
        })
        .count();
    (have * 100 / required_skills.len()) as u8
}

/// An open job scored for one candidate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: JobId,
    pub title: String,
    pub location: String,
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl JobMatch {
    pub fn score(candidate_skills: &[String], job: &Job) -> Self {
        let (matched, missing): (Vec<String>, Vec<String>) =
            job.required_skills.iter().cloned().partition(|req| {
                candidate_skills
                    .iter()
                    .any(|skill| skill.eq_ignore_ascii_case(req))
            });
        Self {
            job_id: job.job_id,
            title: job.title.clone(),
            location: job.location.clone(),
            score: match_score(candidate_skills, &job.required_skills),
            matched_skills: matched,
            missing_skills: missing,
        }
    }
}

/// Rank open jobs for a candidate, best first; ties keep newest first
pub fn rank_jobs(candidate_skills: &[String], jobs: &[Job]) -> Vec<JobMatch> {
    let mut ordered: Vec<&Job> = jobs.iter().filter(|j| j.is_open).collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut matches: Vec<JobMatch> = ordered
        .into_iter()
        .map(|job| JobMatch::score(candidate_skills, job))
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn draft(required: &[&str]) -> JobDraft {
        JobDraft {
            title: "Backend Engineer".into(),
            description: "Build things".into(),
            location: "Berlin".into(),
            required_skills: skills(required),
            assessment_cutoff_score: 70,
        }
    }

    #[test]
    fn test_match_score() {
        let required = skills(&["Rust", "SQL", "Kubernetes"]);
        assert_eq!(match_score(&skills(&["rust", "sql"]), &required), 66);
        assert_eq!(match_score(&skills(&["RUST", "SQL", "kubernetes"]), &required), 100);
        assert_eq!(match_score(&[], &required), 0);
        assert_eq!(match_score(&[], &[]), 100);
    }

    #[test]
    fn test_rank_orders_by_score_and_skips_closed() {
        let company = UserId::new();
        let a = Job::new(company, draft(&["Rust"])).unwrap();
        let b = Job::new(company, draft(&["Go"])).unwrap();
        let mut c = Job::new(company, draft(&[])).unwrap();
        c.close();

        let ranked = rank_jobs(&skills(&["rust"]), &[b.clone(), a.clone(), c]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].job_id, a.job_id);
        assert_eq!(ranked[0].score, 100);
        assert_eq!(ranked[1].missing_skills, vec!["Go".to_string()]);
    }

    #[test]
    fn test_cutoff_must_be_a_percentage() {
        let mut d = draft(&[]);
        d.assessment_cutoff_score = 101;
        assert!(matches!(
            Job::new(UserId::new(), d),
            Err(WorkflowError::Validation { field: "assessmentCutoffScore", .. })
        ));
    }
}
