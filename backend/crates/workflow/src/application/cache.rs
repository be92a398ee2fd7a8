//! Read-through caches for derived job views

use std::collections::BTreeMap;

use kernel::id::{JobId, UserId};
use platform::cache::TtlCache;
use serde::Serialize;

use crate::application::config::WorkflowConfig;
use crate::domain::job::JobMatch;
use crate::domain::status::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub job_id: JobId,
    pub total: i64,
    pub by_status: BTreeMap<ApplicationStatus, i64>,
}

/// Clones share storage
#[derive(Clone)]
pub struct JobCaches {
    pub matches: TtlCache<UserId, Vec<JobMatch>>,
    pub stats: TtlCache<JobId, JobStats>,
}

impl JobCaches {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            matches: TtlCache::with_capacity(config.cache_capacity, config.match_cache_ttl),
            stats: TtlCache::with_capacity(config.cache_capacity, config.stats_cache_ttl),
        }
    }

    /// Any job write can change every candidate's ranking
    pub fn job_changed(&self) {
        self.matches.invalidate_all();
    }

    pub fn application_changed(&self, job_id: &JobId) {
        self.stats.invalidate(job_id);
    }
}
