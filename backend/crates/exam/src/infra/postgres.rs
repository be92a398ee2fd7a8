//! PostgreSQL Repository Implementation
//!
//! Violations and counters are JSONB columns; `version` guards every write.

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, ExamId, ExamSessionId, UserId};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::repository::ExamSessionRepository;
use crate::domain::session::{ExamSession, SUBMITTED_REASON};
use crate::domain::severity::SeverityCounts;
use crate::domain::violation::Violation;
use crate::error::{ExamError, ExamResult};

#[derive(Clone)]
pub struct PgExamSessionRepository {
    pool: PgPool,
}

impl PgExamSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    exam_id,
    application_id,
    started_at,
    expires_at,
    fingerprint,
    ip_address,
    violations,
    severity_counts,
    is_active,
    termination_reason,
    ended_at,
    version
"#;

impl ExamSessionRepository for PgExamSessionRepository {
    async fn create(&self, session: &ExamSession) -> ExamResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO exam_sessions ({SESSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#
        ))
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.exam_id.as_uuid())
        .bind(session.application_id.map(|id| id.into_uuid()))
        .bind(session.started_at)
        .bind(session.expires_at)
        .bind(&session.fingerprint)
        .bind(&session.ip)
        .bind(Json(&session.violations))
        .bind(Json(&session.severity_counts))
        .bind(session.is_active)
        .bind(&session.termination_reason)
        .bind(session.ended_at)
        .bind(session.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(
        &self,
        session_id: &ExamSessionId,
        now: DateTime<Utc>,
    ) -> ExamResult<Option<ExamSession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM exam_sessions
            WHERE session_id = $1 AND expires_at > $2
            "#
        ))
        .bind(session_id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn save(&self, session: &ExamSession) -> ExamResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE exam_sessions SET
                ip_address = $3,
                violations = $4,
                severity_counts = $5,
                is_active = $6,
                termination_reason = $7,
                ended_at = $8,
                version = version + 1
            WHERE session_id = $1 AND version = $2
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.version)
        .bind(&session.ip)
        .bind(Json(&session.violations))
        .bind(Json(&session.severity_counts))
        .bind(session.is_active)
        .bind(&session.termination_reason)
        .bind(session.ended_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM exam_sessions WHERE session_id = $1")
                    .bind(session.session_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;
            return Err(match exists {
                Some(_) => ExamError::ConcurrentModification,
                None => ExamError::SessionNotFound,
            });
        }
        Ok(())
    }

    async fn find_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> ExamResult<Vec<ExamSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM exam_sessions
            WHERE application_id = $1
            ORDER BY started_at
            "#
        ))
        .bind(application_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ExamResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM exam_sessions
            WHERE expires_at <= $1
              AND (is_active OR application_id IS NULL OR termination_reason = $2)
            "#,
        )
        .bind(now)
        .bind(SUBMITTED_REASON)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    exam_id: Uuid,
    application_id: Option<Uuid>,
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    fingerprint: String,
    ip_address: Option<String>,
    violations: Json<Vec<Violation>>,
    severity_counts: Json<SeverityCounts>,
    is_active: bool,
    termination_reason: Option<String>,
    ended_at: Option<DateTime<Utc>>,
    version: i64,
}

impl SessionRow {
    fn into_session(self) -> ExamSession {
        ExamSession {
            session_id: ExamSessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            exam_id: ExamId::from_uuid(self.exam_id),
            application_id: self.application_id.map(ApplicationId::from_uuid),
            started_at: self.started_at,
            expires_at: self.expires_at,
            fingerprint: self.fingerprint,
            ip: self.ip_address,
            violations: self.violations.0,
            severity_counts: self.severity_counts.0,
            is_active: self.is_active,
            termination_reason: self.termination_reason,
            ended_at: self.ended_at,
            version: self.version,
        }
    }
}
