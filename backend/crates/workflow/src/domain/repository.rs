//! Repository Traits

use kernel::id::{ApplicationId, ExamId, JobId, UserId};

use crate::domain::application::Application;
use crate::domain::document::DocumentKind;
use crate::domain::job::Job;
use crate::domain::status::ApplicationStatus;
use crate::error::WorkflowResult;

#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub company_id: Option<UserId>,
    pub open_only: bool,
    pub limit: i64,
    pub offset: i64,
}

#[trait_variant::make(JobRepository: Send)]
pub trait LocalJobRepository {
    async fn create(&self, job: &Job) -> WorkflowResult<()>;

    async fn find_by_id(&self, job_id: &JobId) -> WorkflowResult<Option<Job>>;

    async fn find_by_exam(&self, exam_id: &ExamId) -> WorkflowResult<Option<Job>>;

    /// Newest first
    async fn list(&self, query: JobQuery) -> WorkflowResult<Vec<Job>>;

    async fn update(&self, job: &Job) -> WorkflowResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationQuery {
    pub candidate_id: Option<UserId>,
    /// Restrict to these jobs (a company's postings)
    pub job_ids: Option<Vec<JobId>>,
    pub status: Option<ApplicationStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[trait_variant::make(ApplicationRepository: Send)]
pub trait LocalApplicationRepository {
    /// `DuplicateApplication` if the candidate already applied to the job
    async fn create(&self, application: &Application) -> WorkflowResult<()>;

    async fn find_by_id(&self, application_id: &ApplicationId)
    -> WorkflowResult<Option<Application>>;

    async fn find_for_candidate_job(
        &self,
        candidate_id: &UserId,
        job_id: &JobId,
    ) -> WorkflowResult<Option<Application>>;

    /// Newest first
    async fn list(&self, query: ApplicationQuery) -> WorkflowResult<Vec<Application>>;

    /// Persist a transition made on a copy read at `expected_version`.
    /// Writes status, step, requirements, assessment and rejection reason in
    /// one conditional update and bumps the version. A stale version is
    /// `ConcurrentModification`.
    async fn transition(
        &self,
        application: &Application,
        expected_version: i64,
    ) -> WorkflowResult<()>;

    /// Keyed upsert of one document reference; an existing reference for the
    /// kind wins. Leaves `version` alone.
    async fn attach_document(
        &self,
        application_id: &ApplicationId,
        kind: DocumentKind,
        reference: &str,
    ) -> WorkflowResult<()>;

    async fn count_by_status(&self, job_id: &JobId)
    -> WorkflowResult<Vec<(ApplicationStatus, i64)>>;
}
