//! Application use cases

use std::sync::Arc;

use auth::{User, UserRole};
use kernel::id::JobId;

use crate::application::cache::JobCaches;
use crate::application::config::WorkflowConfig;
use crate::domain::application::Application;
use crate::domain::job::Job;
use crate::domain::repository::{
    ApplicationQuery, ApplicationRepository, JobQuery, JobRepository,
};
use crate::domain::status::ApplicationStatus;
use crate::error::{WorkflowError, WorkflowResult};

/// Candidate owner, the company that owns the job, or an admin
pub fn ensure_can_view(user: &User, application: &Application, job: &Job) -> WorkflowResult<()> {
    let allowed = match user.role {
        UserRole::Admin => true,
        UserRole::Candidate => application.candidate_id == user.user_id,
        UserRole::Company => job.company_id == user.user_id,
    };
    if allowed {
        Ok(())
    } else {
        Err(WorkflowError::forbidden("You cannot access this application"))
    }
}

/// The owning company or an admin
pub fn ensure_can_review(user: &User, job: &Job) -> WorkflowResult<()> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Company if job.company_id == user.user_id => Ok(()),
        _ => Err(WorkflowError::forbidden(
            "Only the hiring company can review this application",
        )),
    }
}

pub struct SubmitApplicationUseCase<J, A>
where
    J: JobRepository + Send + Sync + 'static,
    A: ApplicationRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    applications: Arc<A>,
    caches: JobCaches,
}

impl<J, A> SubmitApplicationUseCase<J, A>
where
    J: JobRepository + Send + Sync + 'static,
    A: ApplicationRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, applications: Arc<A>, caches: JobCaches) -> Self {
        Self {
            jobs,
            applications,
            caches,
        }
    }

    pub async fn execute(
        &self,
        candidate: &User,
        job_id: &JobId,
        cover_letter: Option<String>,
    ) -> WorkflowResult<Application> {
        if candidate.role != UserRole::Candidate {
            return Err(WorkflowError::forbidden("Only candidates can apply to jobs"));
        }
        let job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)?;
        if !job.is_open {
            return Err(WorkflowError::JobClosed);
        }

        let application = Application::submit(candidate.user_id, job.job_id, cover_letter)?;
        self.applications.create(&application).await?;
        self.caches.application_changed(&job.job_id);

        tracing::info!(
            application_id = %application.application_id,
            job_id = %job.job_id,
            candidate_id = %candidate.user_id,
            "Application submitted"
        );
        Ok(application)
    }
}

pub struct ListApplicationsUseCase<J, A>
where
    J: JobRepository + Send + Sync + 'static,
    A: ApplicationRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    applications: Arc<A>,
    config: Arc<WorkflowConfig>,
}

impl<J, A> ListApplicationsUseCase<J, A>
where
    J: JobRepository + Send + Sync + 'static,
    A: ApplicationRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, applications: Arc<A>, config: Arc<WorkflowConfig>) -> Self {
        Self {
            jobs,
            applications,
            config,
        }
    }

    /// Own applications for candidates, applications to own jobs for
    /// companies, everything for admins
    pub async fn execute(
        &self,
        user: &User,
        status: Option<ApplicationStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> WorkflowResult<Vec<Application>> {
        let mut query = ApplicationQuery {
            status,
            limit: self.config.page_size(limit),
            offset: offset.unwrap_or(0).max(0),
            ..Default::default()
        };

        match user.role {
            UserRole::Candidate => query.candidate_id = Some(user.user_id),
            UserRole::Company => {
                let jobs = self
                    .jobs
                    .list(JobQuery {
                        company_id: Some(user.user_id),
                        open_only: false,
                        limit: i64::MAX,
                        offset: 0,
                    })
                    .await?;
                query.job_ids = Some(jobs.into_iter().map(|j| j.job_id).collect());
            }
            UserRole::Admin => {}
        }

        self.applications.list(query).await
    }
}
