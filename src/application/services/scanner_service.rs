use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::application::ports::{
    HintCatalog, JobStore, LockError, MessageQueue, QueueError, RepositoryError,
    ServiceConfigStore, TimeSource,
};
use crate::domain::{
    ErrorPayload, HintConfig, Job, JobId, JobStatus, NewJob, QueueMessage, ServiceConfig, WorkUnit,
};

use super::clock::consistent_time;
use super::hint_planner::plan_hints;
use super::lock_manager::LockManager;

/// Decides whether a scan request reuses an existing job or creates and
/// enqueues a new one.
pub struct ScannerService {
    job_store: Arc<dyn JobStore>,
    config_store: Arc<dyn ServiceConfigStore>,
    work_queue: Arc<dyn MessageQueue>,
    time_source: Arc<dyn TimeSource>,
    catalog: Arc<dyn HintCatalog>,
    locks: LockManager,
}

impl ScannerService {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        config_store: Arc<dyn ServiceConfigStore>,
        work_queue: Arc<dyn MessageQueue>,
        time_source: Arc<dyn TimeSource>,
        catalog: Arc<dyn HintCatalog>,
        locks: LockManager,
    ) -> Self {
        Self {
            job_store,
            config_store,
            work_queue,
            time_source,
            catalog,
            locks,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_job(&self, url: &str) -> Result<Job, ScannerError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScannerError::UrlRequired);
        }

        let service_config = self
            .config_store
            .get_active()
            .await?
            .ok_or(ScannerError::NoActiveConfig)?;

        let handle = self.locks.acquire(url).await?;
        let outcome = self.find_or_create(url, &service_config).await;
        self.locks.release_after(handle, outcome).await
    }

    pub async fn get_job_status(&self, id: JobId) -> Result<Option<Job>, ScannerError> {
        self.job_store.get(id).await.map_err(|e| {
            tracing::error!(job_id = %id, error = %e, "Failed to fetch job");
            ScannerError::Repository(e)
        })
    }

    async fn find_or_create(
        &self,
        url: &str,
        service_config: &ServiceConfig,
    ) -> Result<Job, ScannerError> {
        let jobs = self.job_store.get_latest_by_url(url).await?;
        let now = consistent_time(self.time_source.as_ref(), None).await;

        if let Some(job) = jobs.iter().find(|job| {
            is_active_job(
                job,
                &service_config.webhint_configs,
                service_config.job_cache_time,
                now,
            )
        }) {
            tracing::info!(job_id = %job.id, status = %job.status, "Reusing active job");
            return Ok(job.clone());
        }

        tracing::info!("Active job not found, creating a new job");

        let hints = plan_hints(&service_config.webhint_configs, self.catalog.as_ref());
        let messages_in_queue = self.work_queue.messages_count().await?;
        let queued = consistent_time(self.time_source.as_ref(), None).await;
        let job = self
            .job_store
            .add(NewJob {
                url: url.to_string(),
                status: JobStatus::Pending,
                hints,
                config: service_config.webhint_configs.clone(),
                max_run_time: service_config.job_run_time,
                queued,
                messages_in_queue: Some(messages_in_queue),
            })
            .await?;

        tracing::info!(job_id = %job.id, hints = job.hints.len(), "Created new job");

        // From here on the stored job belongs to the merge stage.
        if let Err(e) = self.enqueue(&job).await {
            tracing::error!(job_id = %job.id, error = %e, "Failed to enqueue job, marking as error");
            return self.mark_failed(job.id, job.queued, &e).await;
        }

        Ok(job)
    }

    /// Sends one work unit per configuration.
    async fn enqueue(&self, job: &Job) -> Result<(), QueueError> {
        let units = WorkUnit::split(job);
        tracing::info!(job_id = %job.id, parts = units.len(), "Splitting job into work units");

        for unit in units {
            let part_info = unit.part_info;
            self.work_queue.send(&QueueMessage::Work(unit)).await?;
            tracing::debug!(job_id = %job.id, part = %part_info, "Work unit sent");
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: JobId,
        queued: DateTime<Utc>,
        cause: &QueueError,
    ) -> Result<Job, ScannerError> {
        let mut job = self
            .job_store
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let now = consistent_time(self.time_source.as_ref(), Some(queued)).await;
        job.status = JobStatus::Error;
        job.started = Some(now);
        job.finished = Some(now);
        job.error.push(ErrorPayload::from_error(cause));

        self.job_store.update(&job).await?;
        Ok(job)
    }
}

/// A stored job can stand in for a new one when it ran with the same
/// configuration, did not fail, and if finished, finished within the cache
/// window.
pub fn is_active_job(
    job: &Job,
    config: &[HintConfig],
    cache_time_secs: u64,
    now: DateTime<Utc>,
) -> bool {
    if job.config.as_slice() != config || job.status == JobStatus::Error {
        return false;
    }

    if job.status != JobStatus::Finished {
        return true;
    }

    let fresh_since = i64::try_from(cache_time_secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window));

    match (job.finished, fresh_since) {
        (Some(finished), Some(since)) => finished > since,
        // Window reaches past the representable range.
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("url is required")]
    UrlRequired,
    #[error("there is no active configuration")]
    NoActiveConfig,
    #[error("lock: {0}")]
    Lock(#[from] LockError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("queue: {0}")]
    Queue(#[from] QueueError),
}
