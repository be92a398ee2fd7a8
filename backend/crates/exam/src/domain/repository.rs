//! Repository Traits
//!
//! A keyed store with expiry, shared by every API instance.

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, ExamSessionId};

use crate::domain::session::ExamSession;
use crate::error::ExamResult;

#[trait_variant::make(ExamSessionRepository: Send)]
pub trait LocalExamSessionRepository {
    async fn create(&self, session: &ExamSession) -> ExamResult<()>;

    /// Sessions past `expires_at` are invisible
    async fn find(
        &self,
        session_id: &ExamSessionId,
        now: DateTime<Utc>,
    ) -> ExamResult<Option<ExamSession>>;

    /// Write back a session read at `session.version`. Bumps the stored
    /// version; a stale version is `ExamError::ConcurrentModification`.
    async fn save(&self, session: &ExamSession) -> ExamResult<()>;

    /// Every attempt bound to the application, oldest first, expired ones
    /// included
    async fn find_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> ExamResult<Vec<ExamSession>>;

    /// Drops expired sessions, except those that ended an application's
    /// attempt by violation
    async fn delete_expired(&self, now: DateTime<Utc>) -> ExamResult<u64>;
}
