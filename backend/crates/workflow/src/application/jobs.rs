//! Job use cases

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::{User, UserRole};
use kernel::id::{JobId, UserId};

use crate::application::cache::{JobCaches, JobStats};
use crate::application::config::WorkflowConfig;
use crate::domain::job::{Job, JobDraft, JobMatch, rank_jobs};
use crate::domain::repository::{ApplicationRepository, JobQuery, JobRepository};
use crate::error::{WorkflowError, WorkflowResult};

/// Open jobs considered for matching
const MATCH_POOL: i64 = 1_000;

fn ensure_owner(actor: &User, job: &Job) -> WorkflowResult<()> {
    if actor.role.is_admin() || job.company_id == actor.user_id {
        Ok(())
    } else {
        Err(WorkflowError::forbidden("Only the owning company can manage this job"))
    }
}

pub struct CreateJobUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    caches: JobCaches,
}

impl<J> CreateJobUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, caches: JobCaches) -> Self {
        Self { jobs, caches }
    }

    pub async fn execute(&self, company: &User, draft: JobDraft) -> WorkflowResult<Job> {
        if company.role != UserRole::Company {
            return Err(WorkflowError::forbidden("Only company accounts can post jobs"));
        }
        let job = Job::new(company.user_id, draft)?;
        self.jobs.create(&job).await?;
        self.caches.job_changed();

        tracing::info!(job_id = %job.job_id, company_id = %company.user_id, "Job created");
        Ok(job)
    }
}

pub struct UpdateJobUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    caches: JobCaches,
}

impl<J> UpdateJobUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, caches: JobCaches) -> Self {
        Self { jobs, caches }
    }

    pub async fn execute(&self, actor: &User, job_id: &JobId, draft: JobDraft) -> WorkflowResult<Job> {
        let mut job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)?;
        ensure_owner(actor, &job)?;

        job.apply(draft)?;
        self.jobs.update(&job).await?;
        self.caches.job_changed();

        tracing::info!(job_id = %job.job_id, "Job updated");
        Ok(job)
    }

    /// Close to new applications; existing ones carry on
    pub async fn close(&self, actor: &User, job_id: &JobId) -> WorkflowResult<Job> {
        let mut job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)?;
        ensure_owner(actor, &job)?;

        job.close();
        self.jobs.update(&job).await?;
        self.caches.job_changed();

        tracing::info!(job_id = %job.job_id, "Job closed");
        Ok(job)
    }
}

pub struct ListJobsUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    config: Arc<WorkflowConfig>,
}

impl<J> ListJobsUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, config: Arc<WorkflowConfig>) -> Self {
        Self { jobs, config }
    }

    pub async fn execute(
        &self,
        company_id: Option<UserId>,
        include_closed: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> WorkflowResult<Vec<Job>> {
        self.jobs
            .list(JobQuery {
                company_id,
                open_only: !include_closed,
                limit: self.config.page_size(limit),
                offset: offset.unwrap_or(0).max(0),
            })
            .await
    }

    pub async fn get(&self, job_id: &JobId) -> WorkflowResult<Job> {
        self.jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)
    }
}

/// Open jobs ranked for a candidate, cached per candidate
pub struct JobMatchesUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    caches: JobCaches,
}

impl<J> JobMatchesUseCase<J>
where
    J: JobRepository + Send + Sync + 'static,
{
    pub fn new(jobs: Arc<J>, caches: JobCaches) -> Self {
        Self { jobs, caches }
    }

    pub async fn execute(&self, candidate: &User) -> WorkflowResult<Vec<JobMatch>> {
        if let Some(hit) = self.caches.matches.get(&candidate.user_id) {
            return Ok(hit);
        }

        let jobs = self
            .jobs
            .list(JobQuery {
                company_id: None,
                open_only: true,
                limit: MATCH_POOL,
                offset: 0,
            })
            .await?;
        let matches = rank_jobs(&candidate.skills, &jobs);
        self.caches
            .matches
            .insert(candidate.user_id, matches.clone());
        Ok(matches)
    }
}

/// Applications per status for one job, cached per job
pub struct JobStatsUseCase<J, A>
where
    J: JobRepository + Send + Sync + 'static,
    A: ApplicationRepository + Send + Sync + 'static,
{
    jobs: Arc<J>,
    applications: Arc<A>,
    caches: JobCaches,
}

impl<J, A> JobStatsUseCase<J, A>
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

    pub async fn execute(&self, actor: &User, job_id: &JobId) -> WorkflowResult<JobStats> {
        let job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)?;
        ensure_owner(actor, &job)?;

        if let Some(hit) = self.caches.stats.get(job_id) {
            return Ok(hit);
        }

        let counts = self.applications.count_by_status(job_id).await?;
        let stats = JobStats {
            job_id: *job_id,
            total: counts.iter().map(|(_, n)| n).sum(),
            by_status: counts.into_iter().collect::<BTreeMap<_, _>>(),
        };
        self.caches.stats.insert(*job_id, stats.clone());
        Ok(stats)
    }
}
