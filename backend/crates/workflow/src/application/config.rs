//! Workflow configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Lifetime of a candidate's cached job matches
    pub match_cache_ttl: Duration,
    /// Lifetime of cached per-job statistics
    pub stats_cache_ttl: Duration,
    pub cache_capacity: usize,
    pub max_page_size: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            match_cache_ttl: Duration::from_secs(5 * 60),
            stats_cache_ttl: Duration::from_secs(60),
            cache_capacity: 10_000,
            max_page_size: 100,
        }
    }
}

impl WorkflowConfig {
    pub fn development() -> Self {
        Self::default()
    }

    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(20).clamp(1, self.max_page_size)
    }
}
