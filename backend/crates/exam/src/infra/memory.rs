//! In-memory session store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, ExamSessionId};
use parking_lot::RwLock;

use crate::domain::repository::ExamSessionRepository;
use crate::domain::session::ExamSession;
use crate::error::{ExamError, ExamResult};

#[derive(Clone, Default)]
pub struct MemoryExamSessionRepository {
    sessions: Arc<RwLock<HashMap<ExamSessionId, ExamSession>>>,
}

impl MemoryExamSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExamSessionRepository for MemoryExamSessionRepository {
    async fn create(&self, session: &ExamSession) -> ExamResult<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.session_id) {
            return Err(ExamError::Internal("Duplicate exam session id".into()));
        }
        sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find(
        &self,
        session_id: &ExamSessionId,
        now: DateTime<Utc>,
    ) -> ExamResult<Option<ExamSession>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|s| !s.is_expired(now))
            .cloned())
    }

    async fn save(&self, session: &ExamSession) -> ExamResult<()> {
        let mut sessions = self.sessions.write();
        let stored = sessions
            .get_mut(&session.session_id)
            .ok_or(ExamError::SessionNotFound)?;
        if stored.version != session.version {
            return Err(ExamError::ConcurrentModification);
        }
        *stored = session.clone();
        stored.version += 1;
        Ok(())
    }

    async fn find_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> ExamResult<Vec<ExamSession>> {
        let mut found: Vec<ExamSession> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.application_id == Some(*application_id))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.started_at);
        Ok(found)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ExamResult<u64> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_purgeable(now));
        Ok((before - sessions.len()) as u64)
    }
}
