//! Exam Security Manager
//!
//! Every operation is read-modify-write against the shared session store.
//! A lost race on `save` re-reads the session and re-applies the change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, ExamId, ExamSessionId, UserId};
use platform::client::ClientFingerprint;

use crate::application::config::ExamConfig;
use crate::domain::repository::ExamSessionRepository;
use crate::domain::session::{ExamSession, SUBMITTED_REASON, SessionCheck, ViolationOutcome};
use crate::domain::severity::Severity;
use crate::domain::violation::{Violation, ViolationKind};
use crate::error::{ExamError, ExamResult};

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: ExamSessionId,
    pub expires_at: DateTime<Utc>,
}

pub struct ExamSecurityManager<R>
where
    R: ExamSessionRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<ExamConfig>,
}

impl<R> ExamSecurityManager<R>
where
    R: ExamSessionRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<ExamConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn initialize_session(
        &self,
        user_id: UserId,
        exam_id: ExamId,
        application_id: Option<ApplicationId>,
        client: &ClientFingerprint,
    ) -> ExamResult<StartedSession> {
        let session = ExamSession::start(
            user_id,
            exam_id,
            application_id,
            client,
            self.config.ttl(),
            Utc::now(),
        );
        self.repo.create(&session).await?;

        tracing::info!(
            session_id = %session.session_id,
            user_id = %user_id,
            exam_id = %exam_id,
            "Exam session started"
        );

        Ok(StartedSession {
            session_id: session.session_id,
            expires_at: session.expires_at,
        })
    }

    /// Refuse a new attempt once an earlier one for the application was
    /// terminated by violation or abandoned through termination
    pub async fn ensure_can_attempt(&self, application_id: &ApplicationId) -> ExamResult<()> {
        let attempts = self.repo.find_for_application(application_id).await?;
        if let Some(ended) = attempts.iter().find(|s| s.ended_by_violation()) {
            tracing::warn!(
                application_id = %application_id,
                session_id = %ended.session_id,
                reason = ended.termination_reason.as_deref().unwrap_or(""),
                "Exam restart refused after terminated attempt"
            );
            return Err(ExamError::SessionTerminated);
        }
        Ok(())
    }

    pub async fn record_violation(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        kind: ViolationKind,
        severity: Severity,
        description: &str,
    ) -> ExamResult<ViolationOutcome> {
        let thresholds = self.config.thresholds;
        let (session, outcome) = self
            .modify(session_id, user_id, |session, now| {
                session.record(
                    Violation::new(kind.clone(), severity, description, now),
                    &thresholds,
                )
            })
            .await?;

        if outcome.terminated {
            tracing::warn!(
                session_id = %session.session_id,
                kind = %kind,
                severity = %severity,
                reason = session.termination_reason.as_deref().unwrap_or(""),
                "Exam session terminated by violation"
            );
        } else {
            tracing::info!(
                session_id = %session.session_id,
                kind = %kind,
                severity = %severity,
                "Exam violation recorded"
            );
        }

        Ok(outcome)
    }

    pub async fn validate_session(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        client: &ClientFingerprint,
    ) -> ExamResult<SessionCheck> {
        let thresholds = self.config.thresholds;
        let (session, check) = self
            .modify(session_id, user_id, |session, now| {
                session.check_client(client, &thresholds, now)
            })
            .await?;

        if !check.valid {
            tracing::warn!(
                session_id = %session.session_id,
                terminated = check.terminated,
                "Exam session failed validation"
            );
        }

        Ok(check)
    }

    /// Idempotent; returns the (possibly already) terminated session
    pub async fn terminate_session(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        reason: &str,
    ) -> ExamResult<ExamSession> {
        let (session, newly) = self
            .modify(session_id, user_id, |session, now| {
                session.terminate(reason, now)
            })
            .await?;

        if newly {
            tracing::info!(session_id = %session.session_id, reason = %reason, "Exam session terminated");
        }

        Ok(session)
    }

    /// Validate the client, then close the session for grading
    pub async fn close_for_submission(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        client: &ClientFingerprint,
    ) -> ExamResult<ExamSession> {
        let check = self.validate_session(session_id, user_id, client).await?;
        if check.terminated {
            return Err(ExamError::SessionTerminated);
        }
        if !check.valid {
            return Err(ExamError::ClientMismatch);
        }

        let (session, closed) = self
            .modify(session_id, user_id, |session, now| {
                session.terminate(SUBMITTED_REASON, now)
            })
            .await?;

        // lost to a concurrent termination between the two writes
        if !closed {
            return Err(ExamError::SessionTerminated);
        }

        tracing::info!(session_id = %session.session_id, "Exam submitted");
        Ok(session)
    }

    pub async fn get_session(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
    ) -> ExamResult<ExamSession> {
        self.load(session_id, user_id, Utc::now()).await
    }

    pub async fn purge_expired(&self) -> ExamResult<u64> {
        let deleted = self.repo.delete_expired(Utc::now()).await?;
        tracing::info!(sessions_deleted = deleted, "Purged expired exam sessions");
        Ok(deleted)
    }

    async fn load(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> ExamResult<ExamSession> {
        let session = self
            .repo
            .find(session_id, now)
            .await?
            .ok_or(ExamError::SessionNotFound)?;
        if session.user_id != *user_id {
            return Err(ExamError::Forbidden);
        }
        Ok(session)
    }

    async fn modify<T, F>(
        &self,
        session_id: &ExamSessionId,
        user_id: &UserId,
        mut apply: F,
    ) -> ExamResult<(ExamSession, T)>
    where
        F: FnMut(&mut ExamSession, DateTime<Utc>) -> T,
    {
        let attempts = self.config.save_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let mut session = self.load(session_id, user_id, now).await?;
            let out = apply(&mut session, now);

            match self.repo.save(&session).await {
                Ok(()) => {
                    session.version += 1;
                    return Ok((session, out));
                }
                Err(ExamError::ConcurrentModification) if attempt < attempts => {
                    tracing::debug!(session_id = %session_id, attempt, "Retrying exam session save");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
