use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::ports::{
    IssueData, IssueErrorType, IssueReporter, JobStore, LockError, MessageQueue, QueueError,
    RepositoryError, Telemetry, TelemetryEvent,
};
use crate::domain::{ErrorPayload, HintStatus, Job, JobStatus, QueueMessage, ResultMessage};

use super::lock_manager::LockManager;

/// Folds result messages into the stored job. Safe under redelivery and
/// out-of-order arrival of sibling parts.
pub struct SyncService {
    job_store: Arc<dyn JobStore>,
    issue_reporter: Arc<dyn IssueReporter>,
    telemetry: Arc<dyn Telemetry>,
    locks: LockManager,
}

impl SyncService {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        issue_reporter: Arc<dyn IssueReporter>,
        telemetry: Arc<dyn Telemetry>,
        locks: LockManager,
    ) -> Self {
        Self {
            job_store,
            issue_reporter,
            telemetry,
            locks,
        }
    }

    /// Merges messages until the queue closes. A failed merge is logged and
    /// left to the transport's redelivery.
    pub async fn consume(&self, results_queue: &dyn MessageQueue) -> Result<(), QueueError> {
        tracing::info!("Sync consumer started");
        while let Some(message) = results_queue.receive().await? {
            match message {
                QueueMessage::Result(result) => {
                    let job_id = result.job_id;
                    if let Err(e) = self.merge_result(result).await {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to merge result");
                    }
                }
                QueueMessage::Work(unit) => {
                    tracing::warn!(job_id = %unit.job.id, "Work unit on results queue, dropping");
                }
            }
        }
        tracing::info!("Sync consumer stopped: queue closed");
        Ok(())
    }

    #[tracing::instrument(
        skip(self, message),
        fields(job_id = %message.job_id, status = %message.status, hints = message.hints.len())
    )]
    pub async fn merge_result(&self, message: ResultMessage) -> Result<(), SyncError> {
        let handle = self.locks.acquire(&message.job_id.to_string()).await?;
        let outcome = self.merge_locked(&message).await;
        self.locks.release_after(handle, outcome).await
    }

    async fn merge_locked(&self, message: &ResultMessage) -> Result<(), SyncError> {
        let Some(mut job) = self.job_store.get(message.job_id).await? else {
            tracing::error!("Job not found in store");
            self.telemetry
                .track_exception(&format!("Job {} not found in database", message.job_id));
            return Ok(());
        };

        if message.status == JobStatus::Started {
            merge_started(&mut job, message);
        } else if !self.merge_terminal(&mut job, message).await {
            tracing::info!("Duplicate result, ignoring");
            return Ok(());
        }

        self.job_store.update(&job).await?;
        tracing::info!(stored_status = %job.status, "Job synchronized");
        Ok(())
    }

    /// Returns `false` when the message changes nothing. Hints are copied
    /// only while pending, so a message whose hints were all resolved by an
    /// earlier delivery or by a sibling part still contributes its error
    /// unless that exact payload is already recorded.
    async fn merge_terminal(&self, job: &mut Job, message: &ResultMessage) -> bool {
        let applied = apply_hints(job, message);
        let error = (message.status == JobStatus::Error).then(|| {
            message
                .error
                .clone()
                .unwrap_or_else(|| ErrorPayload::new("Unknown error"))
        });

        let already_merged = applied == 0
            && match &error {
                Some(error) => job.error.contains(error),
                None => !message.hints.is_empty(),
            };

        if already_merged {
            let finished = latest(job.finished, message.finished);
            let changed = finished != job.finished;
            job.finished = finished;
            return changed;
        }

        if let Some(log) = message.log.as_deref().filter(|l| !l.is_empty()) {
            job.log.push_str(log);
            job.log.push('\n');
        }

        match error {
            Some(error) => {
                job.error.push(error.clone());
                self.report_crash(message, &error).await;
            }
            None => self.report_timeout(message).await,
        }

        job.finished = latest(job.finished, message.finished);

        if job.all_hints_resolved() {
            self.finalize(job, message.status).await;
        }

        true
    }

    async fn finalize(&self, job: &mut Job, incoming: JobStatus) {
        let status = if job.error.is_empty() {
            incoming
        } else {
            JobStatus::Error
        };

        if !job.status.can_transition_to(status) {
            tracing::warn!(from = %job.status, to = %status, "Ignoring invalid status transition");
            return;
        }

        job.status = status;
        tracing::info!(status = %status, "Job finalized");

        match status {
            JobStatus::Finished => {
                if !job.has_timeout() {
                    self.close_issues(job).await;
                }
                self.telemetry.track_event(finish_event(job));
            }
            JobStatus::Error => {
                if job.has_timeout() {
                    self.telemetry.track_event(TelemetryEvent::named("online-timeout"));
                } else {
                    self.telemetry.track_event(TelemetryEvent::named("online-error"));
                    for error in &job.error {
                        self.telemetry.track_exception(&error.message);
                    }
                }
            }
            JobStatus::Pending | JobStatus::Started => {}
        }
    }

    async fn report_crash(&self, message: &ResultMessage, error: &ErrorPayload) {
        let error_message =
            serde_json::to_string(&error.message).unwrap_or_else(|_| error.message.clone());
        self.report(IssueData {
            url: message.url.clone(),
            scan: scan_label(Utc::now()),
            error_type: Some(IssueErrorType::Crash),
            error_message: Some(error_message),
            configs: Some(message.config.clone()),
            log: message.log.clone(),
        })
        .await;
    }

    async fn report_timeout(&self, message: &ResultMessage) {
        let Some(hint) = message.hints.first().filter(|h| h.is_timeout()) else {
            return;
        };
        self.report(IssueData {
            url: message.url.clone(),
            scan: scan_label(Utc::now()),
            error_type: Some(IssueErrorType::Timeout),
            error_message: hint.messages.first().map(|m| m.message.clone()),
            configs: Some(message.config.clone()),
            log: message.log.clone(),
        })
        .await;
    }

    async fn close_issues(&self, job: &Job) {
        self.report(IssueData {
            url: job.url.clone(),
            scan: scan_label(Utc::now()),
            error_type: None,
            error_message: None,
            configs: None,
            log: None,
        })
        .await;
    }

    /// Tracker failures never fail the merge.
    async fn report(&self, issue: IssueData) {
        match self.issue_reporter.report(&issue).await {
            Ok(()) => tracing::info!(
                error_type = issue.error_type.map(|t| t.as_str()).unwrap_or("none"),
                "Issue tracker updated"
            ),
            Err(e) => tracing::error!(error = %e, "Error reporting to issue tracker"),
        }
    }
}

/// First `started` message stamps the analyzer version; `started` keeps the
/// earliest value seen.
fn merge_started(job: &mut Job, message: &ResultMessage) {
    if job.status != JobStatus::Started {
        job.webhint_version = message.webhint_version.clone();
    }

    job.started = earliest(job.started, message.started);

    if job.status == JobStatus::Pending {
        job.status = JobStatus::Started;
    }
}

/// Copies incoming results into hints that are still pending. Returns how
/// many hints changed.
fn apply_hints(job: &mut Job, message: &ResultMessage) -> usize {
    let mut applied = 0;
    for incoming in &message.hints {
        match job.hint_mut(&incoming.name) {
            Some(stored) if stored.is_pending() => {
                stored.messages = incoming.messages.clone();
                stored.status = incoming.status;
                if incoming.status != HintStatus::Pending {
                    applied += 1;
                }
            }
            Some(_) => tracing::debug!(hint = %incoming.name, "Hint already resolved, skipping"),
            None => tracing::warn!(hint = %incoming.name, "Hint not part of the job, skipping"),
        }
    }
    applied
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn scan_label(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

fn finish_event(job: &Job) -> TelemetryEvent {
    let mut event = TelemetryEvent::named("online-finish");

    if let (Some(started), Some(finished)) = (job.started, job.finished) {
        event.measurements.insert(
            "online-finish-duration".to_string(),
            (finished - started).num_milliseconds() as f64,
        );
    }
    if let Some(started) = job.started {
        event.measurements.insert(
            "online-start-duration".to_string(),
            (started - job.queued).num_milliseconds() as f64,
        );
    }

    for hint in &job.hints {
        let outcome = if hint.status == HintStatus::Pass {
            "passed"
        } else {
            "failed"
        };
        event
            .properties
            .insert(hint.name.clone(), outcome.to_string());
    }

    event
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("lock: {0}")]
    Lock(#[from] LockError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
