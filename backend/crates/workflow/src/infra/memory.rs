//! In-memory stores
//!
//! The (candidate, job) uniqueness and the version check run under the
//! write lock, as the unique index and conditional update do in SQL.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::{ApplicationId, ExamId, JobId, UserId};
use parking_lot::RwLock;

use crate::domain::application::Application;
use crate::domain::document::DocumentKind;
use crate::domain::job::Job;
use crate::domain::repository::{
    ApplicationQuery, ApplicationRepository, JobQuery, JobRepository,
};
use crate::domain::status::ApplicationStatus;
use crate::error::{WorkflowError, WorkflowResult};

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryJobRepository {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for MemoryJobRepository {
    async fn create(&self, job: &Job) -> WorkflowResult<()> {
        self.jobs.write().insert(job.job_id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: &JobId) -> WorkflowResult<Option<Job>> {
        Ok(self.jobs.read().get(job_id).cloned())
    }

    async fn find_by_exam(&self, exam_id: &ExamId) -> WorkflowResult<Option<Job>> {
        Ok(self
            .jobs
            .read()
            .values()
            .find(|j| j.exam_id == *exam_id)
            .cloned())
    }

    async fn list(&self, query: JobQuery) -> WorkflowResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .values()
            .filter(|j| query.company_id.is_none_or(|c| j.company_id == c))
            .filter(|j| !query.open_only || j.is_open)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(jobs, query.limit, query.offset))
    }

    async fn update(&self, job: &Job) -> WorkflowResult<()> {
        let mut jobs = self.jobs.write();
        let stored = jobs.get_mut(&job.job_id).ok_or(WorkflowError::JobNotFound)?;
        *stored = job.clone();
        Ok(())
    }
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryApplicationRepository {
    applications: Arc<RwLock<HashMap<ApplicationId, Application>>>,
}

impl MemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationRepository for MemoryApplicationRepository {
    async fn create(&self, application: &Application) -> WorkflowResult<()> {
        let mut applications = self.applications.write();
        let taken = applications.values().any(|a| {
            a.candidate_id == application.candidate_id && a.job_id == application.job_id
        });
        if taken {
            return Err(WorkflowError::DuplicateApplication);
        }
        applications.insert(application.application_id, application.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<Option<Application>> {
        Ok(self.applications.read().get(application_id).cloned())
    }

    async fn find_for_candidate_job(
        &self,
        candidate_id: &UserId,
        job_id: &JobId,
    ) -> WorkflowResult<Option<Application>> {
        Ok(self
            .applications
            .read()
            .values()
            .find(|a| a.candidate_id == *candidate_id && a.job_id == *job_id)
            .cloned())
    }

    async fn list(&self, query: ApplicationQuery) -> WorkflowResult<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .applications
            .read()
            .values()
            .filter(|a| query.candidate_id.is_none_or(|c| a.candidate_id == c))
            .filter(|a| {
                query
                    .job_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&a.job_id))
            })
            .filter(|a| query.status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(applications, query.limit, query.offset))
    }

    async fn transition(
        &self,
        application: &Application,
        expected_version: i64,
    ) -> WorkflowResult<()> {
        let mut applications = self.applications.write();
        let stored = applications
            .get_mut(&application.application_id)
            .ok_or(WorkflowError::ApplicationNotFound)?;
        if stored.version != expected_version {
            return Err(WorkflowError::ConcurrentModification);
        }
        stored.status = application.status;
        stored.current_step = application.current_step;
        stored.payment_requirements = application.payment_requirements;
        stored.assessment = application.assessment.clone();
        stored.rejection_reason = application.rejection_reason.clone();
        stored.updated_at = application.updated_at;
        stored.version = expected_version + 1;
        Ok(())
    }

    async fn attach_document(
        &self,
        application_id: &ApplicationId,
        kind: DocumentKind,
        reference: &str,
    ) -> WorkflowResult<()> {
        let mut applications = self.applications.write();
        let stored = applications
            .get_mut(application_id)
            .ok_or(WorkflowError::ApplicationNotFound)?;
        stored
            .generated_documents
            .entry(kind)
            .or_insert_with(|| reference.to_string());
        Ok(())
    }

    async fn count_by_status(
        &self,
        job_id: &JobId,
    ) -> WorkflowResult<Vec<(ApplicationStatus, i64)>> {
        let mut counts: HashMap<ApplicationStatus, i64> = HashMap::new();
        for a in self.applications.read().values().filter(|a| a.job_id == *job_id) {
            *counts.entry(a.status).or_default() += 1;
        }
        let mut counts: Vec<(ApplicationStatus, i64)> = counts.into_iter().collect();
        counts.sort_by_key(|(s, _)| *s);
        Ok(counts)
    }
}
