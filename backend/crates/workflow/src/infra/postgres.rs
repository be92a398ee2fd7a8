//! PostgreSQL Repository Implementation

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{ApplicationId, ExamId, JobId, UserId};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::application::{Application, AssessmentRecord};
use crate::domain::document::DocumentKind;
use crate::domain::gates::PaymentRequirements;
use crate::domain::job::Job;
use crate::domain::repository::{
    ApplicationQuery, ApplicationRepository, JobQuery, JobRepository,
};
use crate::domain::status::{ApplicationStatus, WorkflowStep};
use crate::error::{WorkflowError, WorkflowResult};

// ============================================================================
// Jobs
// ============================================================================

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = r#"
    job_id,
    company_id,
    title,
    description,
    location,
    required_skills,
    assessment_cutoff_score,
    exam_id,
    is_open,
    created_at,
    updated_at
"#;

impl JobRepository for PgJobRepository {
    async fn create(&self, job: &Job) -> WorkflowResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO jobs ({JOB_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        ))
        .bind(job.job_id.as_uuid())
        .bind(job.company_id.as_uuid())
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.required_skills)
        .bind(job.assessment_cutoff_score)
        .bind(job.exam_id.as_uuid())
        .bind(job.is_open)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, job_id: &JobId) -> WorkflowResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"
        ))
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(JobRow::into_job))
    }

    async fn find_by_exam(&self, exam_id: &ExamId) -> WorkflowResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE exam_id = $1"
        ))
        .bind(exam_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(JobRow::into_job))
    }

    async fn list(&self, query: JobQuery) -> WorkflowResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE ($1::UUID IS NULL OR company_id = $1)
              AND (NOT $2 OR is_open)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(query.company_id.map(|id| id.into_uuid()))
        .bind(query.open_only)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JobRow::into_job).collect())
    }

    async fn update(&self, job: &Job) -> WorkflowResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs SET
                title = $2,
                description = $3,
                location = $4,
                required_skills = $5,
                assessment_cutoff_score = $6,
                is_open = $7,
                updated_at = $8
            WHERE job_id = $1
            "#,
        )
        .bind(job.job_id.as_uuid())
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.required_skills)
        .bind(job.assessment_cutoff_score)
        .bind(job.is_open)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::JobNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const APPLICATION_COLUMNS: &str = r#"
    application_id,
    candidate_id,
    job_id,
    status,
    current_step,
    payment_requirements,
    assessment,
    generated_documents,
    rejection_reason,
    cover_letter,
    version,
    created_at,
    updated_at
"#;

impl ApplicationRepository for PgApplicationRepository {
    async fn create(&self, application: &Application) -> WorkflowResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO applications ({APPLICATION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        ))
        .bind(application.application_id.as_uuid())
        .bind(application.candidate_id.as_uuid())
        .bind(application.job_id.as_uuid())
        .bind(application.status.code())
        .bind(application.current_step.code())
        .bind(Json(&application.payment_requirements))
        .bind(application.assessment.as_ref().map(Json))
        .bind(Json(&application.generated_documents))
        .bind(&application.rejection_reason)
        .bind(&application.cover_letter)
        .bind(application.version)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // applications_candidate_job_key
            if is_unique_violation(&e) {
                WorkflowError::DuplicateApplication
            } else {
                WorkflowError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE application_id = $1"
        ))
        .bind(application_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ApplicationRow::into_application).transpose()
    }

    async fn find_for_candidate_job(
        &self,
        candidate_id: &UserId,
        job_id: &JobId,
    ) -> WorkflowResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE candidate_id = $1 AND job_id = $2
            "#
        ))
        .bind(candidate_id.as_uuid())
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ApplicationRow::into_application).transpose()
    }

    async fn list(&self, query: ApplicationQuery) -> WorkflowResult<Vec<Application>> {
        let job_ids: Option<Vec<Uuid>> = query
            .job_ids
            .map(|ids| ids.into_iter().map(|id| id.into_uuid()).collect());

        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE ($1::UUID IS NULL OR candidate_id = $1)
              AND ($2::UUID[] IS NULL OR job_id = ANY($2))
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(query.candidate_id.map(|id| id.into_uuid()))
        .bind(job_ids)
        .bind(query.status.map(|s| s.code()))
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(ApplicationRow::into_application)
            .collect()
    }

    async fn transition(
        &self,
        application: &Application,
        expected_version: i64,
    ) -> WorkflowResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                status = $3,
                current_step = $4,
                payment_requirements = $5,
                assessment = $6,
                rejection_reason = $7,
                updated_at = $8,
                version = version + 1
            WHERE application_id = $1 AND version = $2
            "#,
        )
        .bind(application.application_id.as_uuid())
        .bind(expected_version)
        .bind(application.status.code())
        .bind(application.current_step.code())
        .bind(Json(&application.payment_requirements))
        .bind(application.assessment.as_ref().map(Json))
        .bind(&application.rejection_reason)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM applications WHERE application_id = $1")
                    .bind(application.application_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;
            return Err(match exists {
                Some(_) => WorkflowError::ConcurrentModification,
                None => WorkflowError::ApplicationNotFound,
            });
        }
        Ok(())
    }

    async fn attach_document(
        &self,
        application_id: &ApplicationId,
        kind: DocumentKind,
        reference: &str,
    ) -> WorkflowResult<()> {
        // right-hand side wins in `||`, so an existing reference is kept
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET generated_documents = jsonb_build_object($2::TEXT, $3::TEXT) || generated_documents
            WHERE application_id = $1
            "#,
        )
        .bind(application_id.as_uuid())
        .bind(kind.code())
        .bind(reference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::ApplicationNotFound);
        }
        Ok(())
    }

    async fn count_by_status(
        &self,
        job_id: &JobId,
    ) -> WorkflowResult<Vec<(ApplicationStatus, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM applications
            WHERE job_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count)| {
                ApplicationStatus::from_code(&status)
                    .map(|s| (s, count))
                    .ok_or_else(|| WorkflowError::Internal(format!("Invalid status: {status}")))
            })
            .collect()
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: Uuid,
    company_id: Uuid,
    title: String,
    description: String,
    location: String,
    required_skills: Vec<String>,
    assessment_cutoff_score: i32,
    exam_id: Uuid,
    is_open: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRow {
    fn into_job(self) -> Job {
        Job {
            job_id: JobId::from_uuid(self.job_id),
            company_id: UserId::from_uuid(self.company_id),
            title: self.title,
            description: self.description,
            location: self.location,
            required_skills: self.required_skills,
            assessment_cutoff_score: self.assessment_cutoff_score,
            exam_id: ExamId::from_uuid(self.exam_id),
            is_open: self.is_open,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    application_id: Uuid,
    candidate_id: Uuid,
    job_id: Uuid,
    status: String,
    current_step: String,
    payment_requirements: Json<PaymentRequirements>,
    assessment: Option<Json<AssessmentRecord>>,
    generated_documents: Json<BTreeMap<DocumentKind, String>>,
    rejection_reason: Option<String>,
    cover_letter: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_application(self) -> WorkflowResult<Application> {
        let status = ApplicationStatus::from_code(&self.status)
            .ok_or_else(|| WorkflowError::Internal(format!("Invalid status: {}", self.status)))?;
        let current_step = WorkflowStep::from_code(&self.current_step).ok_or_else(|| {
            WorkflowError::Internal(format!("Invalid workflow step: {}", self.current_step))
        })?;

        Ok(Application {
            application_id: ApplicationId::from_uuid(self.application_id),
            candidate_id: UserId::from_uuid(self.candidate_id),
            job_id: JobId::from_uuid(self.job_id),
            status,
            current_step,
            payment_requirements: self.payment_requirements.0,
            assessment: self.assessment.map(|a| a.0),
            generated_documents: self.generated_documents.0,
            rejection_reason: self.rejection_reason,
            cover_letter: self.cover_letter,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
