use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a scan job: `pending -> started -> finished | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Started,
    Finished,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
            JobStatus::Error => "error",
        }
    }

    /// `finished -> error` is allowed because the final status is derived from
    /// the accumulated error list, which a slower part may still extend.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (a, b) if *a == b => true,
            (JobStatus::Pending, _) => true,
            (JobStatus::Started, JobStatus::Finished | JobStatus::Error) => true,
            (JobStatus::Finished, JobStatus::Error) => true,
            _ => false,
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "started" => Ok(JobStatus::Started),
            "finished" => Ok(JobStatus::Finished),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
