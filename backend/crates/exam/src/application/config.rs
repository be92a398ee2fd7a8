//! Exam configuration

use std::time::Duration;

use crate::domain::severity::Thresholds;

#[derive(Debug, Clone)]
pub struct ExamConfig {
    pub thresholds: Thresholds,
    /// Hard limit on a session's lifetime
    pub session_ttl: Duration,
    /// Attempts when a concurrent writer wins the save
    pub save_attempts: u32,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            session_ttl: Duration::from_secs(3 * 3600),
            save_attempts: 3,
        }
    }
}

impl ExamConfig {
    pub fn development() -> Self {
        Self::default()
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl).unwrap_or(chrono::Duration::hours(3))
    }
}
