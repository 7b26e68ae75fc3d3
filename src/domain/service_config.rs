use serde::{Deserialize, Serialize};

use super::HintConfig;

/// Analysis configuration the scheduler applies to new jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub active: bool,
    /// Seconds a finished job stays reusable.
    pub job_cache_time: u64,
    /// Default `max_run_time` for new jobs, in seconds.
    pub job_run_time: u64,
    pub webhint_configs: Vec<HintConfig>,
}

impl ServiceConfig {
    pub fn new(
        name: impl Into<String>,
        job_cache_time: u64,
        job_run_time: u64,
        webhint_configs: Vec<HintConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            active: false,
            job_cache_time,
            job_run_time,
            webhint_configs,
        }
    }
}
