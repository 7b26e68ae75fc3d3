use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ErrorPayload, Hint, HintConfig, Job, JobId, JobStatus, PartInfo};

/// One job narrowed to a single configuration, queued for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub job: Job,
    pub part_info: PartInfo,
}

impl WorkUnit {
    /// Splits a job into one unit per configuration entry, numbered `1..=N`.
    pub fn split(job: &Job) -> Vec<WorkUnit> {
        let total_parts = job.config.len() as u32;
        job.config
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let mut part = job.clone();
                part.config = vec![config.clone()];
                WorkUnit {
                    job: part,
                    part_info: PartInfo {
                        part: index as u32 + 1,
                        total_parts,
                    },
                }
            })
            .collect()
    }

    pub fn config(&self) -> Option<&HintConfig> {
        self.job.config.first()
    }
}

/// Partial or final outcome of one work unit, consumed by the merge stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub job_id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub part_info: Option<PartInfo>,
    pub queued: DateTime<Utc>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub error: Option<ErrorPayload>,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub webhint_version: Option<String>,
    #[serde(default)]
    pub config: Vec<HintConfig>,
}

impl ResultMessage {
    /// Snapshot of a unit's job with the given status and no hints attached.
    pub fn from_unit(unit: &WorkUnit, status: JobStatus) -> Self {
        Self {
            job_id: unit.job.id,
            url: unit.job.url.clone(),
            status,
            part_info: Some(unit.part_info),
            queued: unit.job.queued,
            started: unit.job.started,
            finished: unit.job.finished,
            hints: Vec::new(),
            error: None,
            log: None,
            webhint_version: unit.job.webhint_version.clone(),
            config: unit.job.config.clone(),
        }
    }

    pub fn has_timeout(&self) -> bool {
        self.hints.iter().any(Hint::is_timeout)
    }
}

/// Envelope carried by the message queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueMessage {
    Work(WorkUnit),
    Result(ResultMessage),
}

impl QueueMessage {
    pub fn job_id(&self) -> JobId {
        match self {
            QueueMessage::Work(unit) => unit.job.id,
            QueueMessage::Result(result) => result.job_id,
        }
    }
}
