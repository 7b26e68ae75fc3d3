use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Job, JobId, NewJob};

use super::RepositoryError;

/// Timestamp column used for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDateField {
    Queued,
    Started,
    Finished,
}

impl JobDateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobDateField::Queued => "queued",
            JobDateField::Started => "started",
            JobDateField::Finished => "finished",
        }
    }

    pub fn value_of(&self, job: &Job) -> Option<DateTime<Utc>> {
        match self {
            JobDateField::Queued => Some(job.queued),
            JobDateField::Started => job.started,
            JobDateField::Finished => job.finished,
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn add(&self, job: NewJob) -> Result<Job, RepositoryError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Most recently queued job for the url, if any.
    async fn get_latest_by_url(&self, url: &str) -> Result<Vec<Job>, RepositoryError>;

    /// Jobs whose `field` lies in `[from, to)`.
    async fn get_by_date_range(
        &self,
        field: JobDateField,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError>;

    /// Replaces the stored record, including the nested hint list.
    async fn update(&self, job: &Job) -> Result<(), RepositoryError>;
}
