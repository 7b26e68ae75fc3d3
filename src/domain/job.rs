use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ErrorPayload, Hint, HintConfig, HintStatus, JobId, JobStatus};

/// Canonical job record, owned by the job store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub config: Vec<HintConfig>,
    pub hints: Vec<Hint>,
    /// Execution budget in seconds.
    pub max_run_time: u64,
    pub queued: DateTime<Utc>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Vec<ErrorPayload>,
    #[serde(default)]
    pub messages_in_queue: Option<u64>,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub webhint_version: Option<String>,
}

/// Fields the scheduler supplies when persisting a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub url: String,
    pub status: JobStatus,
    pub hints: Vec<Hint>,
    pub config: Vec<HintConfig>,
    pub max_run_time: u64,
    pub queued: DateTime<Utc>,
    pub messages_in_queue: Option<u64>,
}

impl Job {
    pub fn create(new_job: NewJob) -> Self {
        Self {
            id: JobId::new(),
            url: new_job.url,
            status: new_job.status,
            config: new_job.config,
            hints: new_job.hints,
            max_run_time: new_job.max_run_time,
            queued: new_job.queued,
            started: None,
            finished: None,
            error: Vec::new(),
            messages_in_queue: new_job.messages_in_queue,
            log: String::new(),
            webhint_version: None,
        }
    }

    pub fn hint_mut(&mut self, name: &str) -> Option<&mut Hint> {
        self.hints.iter_mut().find(|h| h.name == name)
    }

    /// Every hint has left `pending`.
    pub fn all_hints_resolved(&self) -> bool {
        self.hints.iter().all(|h| h.status != HintStatus::Pending)
    }

    pub fn has_timeout(&self) -> bool {
        self.hints.iter().any(Hint::is_timeout)
    }
}
