use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    AnalysisFailure, AnalysisRunner, HintCatalog, MessageQueue, QueueError, TimeSource,
};
use crate::domain::{
    GENERIC_ERROR_MESSAGE, Hint, HintSeverity, HintStatus, JobStatus, Problem, QueueMessage,
    ResultMessage, Severity, TIMEOUT_MESSAGE, WorkUnit,
};

use super::clock::consistent_time;
use super::hint_planner::normalize_hints;
use super::result_packer::ResultPacker;

/// Budget applied when a job carries no `max_run_time`.
pub const DEFAULT_RUN_TIME: Duration = Duration::from_secs(180);

/// Runs one work unit and reports `started` followed by exactly one terminal
/// result to the results queue.
pub struct WorkerService {
    results_queue: Arc<dyn MessageQueue>,
    runner: Arc<dyn AnalysisRunner>,
    time_source: Arc<dyn TimeSource>,
    catalog: Arc<dyn HintCatalog>,
    packer: ResultPacker,
}

impl WorkerService {
    pub fn new(
        results_queue: Arc<dyn MessageQueue>,
        runner: Arc<dyn AnalysisRunner>,
        time_source: Arc<dyn TimeSource>,
        catalog: Arc<dyn HintCatalog>,
        packer: ResultPacker,
    ) -> Self {
        Self {
            results_queue,
            runner,
            time_source,
            catalog,
            packer,
        }
    }

    /// Pulls work units until the queue closes. Messages of the wrong kind are
    /// dropped; a failed send stops the loop.
    pub async fn consume(&self, work_queue: &dyn MessageQueue) -> Result<(), WorkerError> {
        tracing::info!("Worker started");
        while let Some(message) = work_queue.receive().await? {
            match message {
                QueueMessage::Work(unit) => self.run(unit).await?,
                QueueMessage::Result(result) => {
                    tracing::warn!(job_id = %result.job_id, "Result message on work queue, dropping");
                }
            }
        }
        tracing::info!("Worker stopped: queue closed");
        Ok(())
    }

    #[tracing::instrument(
        skip(self, unit),
        fields(job_id = %unit.job.id, part = %unit.part_info, url = %unit.job.url)
    )]
    pub async fn run(&self, mut unit: WorkUnit) -> Result<(), WorkerError> {
        tracing::info!("Processing work unit");

        let configured = unit
            .config()
            .map(|config| normalize_hints(config, self.catalog.as_ref()))
            .unwrap_or_default();

        unit.job.webhint_version = Some(self.runner.version());
        unit.job.status = JobStatus::Started;
        unit.job.started =
            Some(consistent_time(self.time_source.as_ref(), Some(unit.job.queued)).await);

        self.results_queue
            .send(&QueueMessage::Result(ResultMessage::from_unit(
                &unit,
                JobStatus::Started,
            )))
            .await?;
        tracing::info!("Started message sent");

        let budget = match unit.job.max_run_time {
            0 => DEFAULT_RUN_TIME,
            secs => Duration::from_secs(secs),
        };

        let outcome = self.runner.run(&unit, budget).await;
        unit.job.finished = Some(consistent_time(self.time_source.as_ref(), unit.job.started).await);

        match outcome {
            Ok(problems) => {
                unit.job.status = JobStatus::Finished;
                apply_findings(&mut unit.job.hints, problems, &configured);

                let mut message = ResultMessage::from_unit(&unit, JobStatus::Finished);
                message.hints = in_scope(&unit.job.hints, &configured);

                let sent = self
                    .packer
                    .deliver(self.results_queue.as_ref(), message)
                    .await?;
                tracing::info!(messages = sent, "Processed work unit");
            }
            Err(failure) => {
                tracing::error!(error = %failure, "Analysis failed");
                apply_failure(&mut unit.job.hints, &configured, &failure);

                let status = if failure.is_timeout() {
                    JobStatus::Finished
                } else {
                    JobStatus::Error
                };
                unit.job.status = status;

                let mut message = ResultMessage::from_unit(&unit, status);
                message.hints = in_scope(&unit.job.hints, &configured);
                message.error = Some(failure.payload());
                message.log = failure.log().map(str::to_string);

                self.packer
                    .send_with_truncation(self.results_queue.as_ref(), message)
                    .await?;
                tracing::info!(status = %status, "Failure reported");
            }
        }

        Ok(())
    }
}

/// Hints configured for this unit, in job order.
fn in_scope(hints: &[Hint], configured: &BTreeMap<String, HintSeverity>) -> Vec<Hint> {
    hints
        .iter()
        .filter(|h| configured.contains_key(&h.name))
        .cloned()
        .collect()
}

/// Groups findings by hint. No findings is a pass; otherwise the worst
/// severity decides between `error` and `warning`.
pub fn apply_findings(
    hints: &mut [Hint],
    problems: Vec<Problem>,
    configured: &BTreeMap<String, HintSeverity>,
) {
    let mut grouped: HashMap<String, Vec<Problem>> = HashMap::new();
    for problem in problems {
        grouped
            .entry(problem.hint_id.clone())
            .or_default()
            .push(problem);
    }

    for hint in hints.iter_mut() {
        if !configured.contains_key(&hint.name) {
            continue;
        }

        match grouped.remove(&hint.name) {
            None => {
                hint.status = HintStatus::Pass;
                hint.messages = Vec::new();
            }
            Some(messages) => {
                hint.status = if messages.iter().any(|m| m.severity == Severity::Error) {
                    HintStatus::Error
                } else {
                    HintStatus::Warning
                };
                hint.messages = messages;
            }
        }
    }
}

/// Marks every configured hint after a failed run: `off` stays off, a timeout
/// becomes a warning, anything else an error.
pub fn apply_failure(
    hints: &mut [Hint],
    configured: &BTreeMap<String, HintSeverity>,
    failure: &AnalysisFailure,
) {
    let (status, severity, text) = if failure.is_timeout() {
        (HintStatus::Warning, Severity::Warning, TIMEOUT_MESSAGE)
    } else {
        (HintStatus::Error, Severity::Error, GENERIC_ERROR_MESSAGE)
    };

    for hint in hints.iter_mut() {
        match configured.get(&hint.name) {
            None => continue,
            Some(HintSeverity::Off) => hint.status = HintStatus::Off,
            Some(_) => {
                hint.status = status;
                hint.messages = vec![Problem::synthetic(hint, text, severity)];
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("queue: {0}")]
    Queue(#[from] QueueError),
}
