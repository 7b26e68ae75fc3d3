#![allow(dead_code)]

pub mod test_postgres;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use scanhub::application::ports::{
    AnalysisFailure, AnalysisRunner, IssueData, IssueReporter, IssueReporterError, MessageQueue,
    QueueError, Telemetry, TelemetryEvent, TimeSource,
};
use scanhub::domain::{
    Hint, HintConfig, HintSeverity, Job, JobStatus, NewJob, Problem, QueueMessage, Severity,
    ServiceConfig,
};
use scanhub::infrastructure::catalog::StaticHintCatalog;

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

pub fn hint_config(hints: &[(&str, HintSeverity)]) -> HintConfig {
    HintConfig::with_hints(hints.iter().map(|(name, severity)| (name.to_string(), *severity)))
}

pub fn service_config(configs: Vec<HintConfig>) -> ServiceConfig {
    ServiceConfig::new("default", 180, 120, configs)
}

pub fn catalog() -> StaticHintCatalog {
    StaticHintCatalog::new(
        HashMap::from([(
            "web-recommended".to_string(),
            vec!["axe".to_string(), "http-cache".to_string()],
        )]),
        HashMap::from([("axe".to_string(), "accessibility".to_string())]),
    )
}

pub fn job_with_hints(url: &str, names: &[&str], configs: Vec<HintConfig>) -> Job {
    Job::create(NewJob {
        url: url.to_string(),
        status: JobStatus::Pending,
        hints: names.iter().map(|n| Hint::pending(*n, "other")).collect(),
        config: configs,
        max_run_time: 120,
        queued: at(0),
        messages_in_queue: None,
    })
}

pub fn problem(hint: &str, severity: Severity, message: &str) -> Problem {
    Problem {
        hint_id: hint.to_string(),
        message: message.to_string(),
        severity,
        category: "other".to_string(),
        location: Default::default(),
        resource: Some("https://example.com/".to_string()),
        source_code: None,
    }
}

/// Time source replaying a fixed script; `None` entries simulate outages.
pub struct ScriptedTimeSource {
    script: Mutex<VecDeque<Option<DateTime<Utc>>>>,
}

impl ScriptedTimeSource {
    pub fn new(script: Vec<Option<DateTime<Utc>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self::new(vec![Some(now); 64])
    }
}

#[async_trait::async_trait]
impl TimeSource for ScriptedTimeSource {
    async fn now(&self) -> Option<DateTime<Utc>> {
        self.script.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Mutex<Vec<TelemetryEvent>>,
    pub exceptions: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }
}

impl Telemetry for RecordingTelemetry {
    fn track_event(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn track_exception(&self, message: &str) {
        self.exceptions.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingIssueReporter {
    pub reports: Mutex<Vec<IssueData>>,
    pub fail: bool,
}

impl RecordingIssueReporter {
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn reports(&self) -> Vec<IssueData> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IssueReporter for RecordingIssueReporter {
    async fn report(&self, issue: &IssueData) -> Result<(), IssueReporterError> {
        self.reports.lock().unwrap().push(issue.clone());
        if self.fail {
            return Err(IssueReporterError::RequestFailed("tracker down".to_string()));
        }
        Ok(())
    }
}

/// Queue that records sent messages and can reject sends.
#[derive(Default)]
pub struct RecordingQueue {
    pub sent: Mutex<Vec<QueueMessage>>,
    /// Outcomes of upcoming sends, in order: `Some` rejects, `None` accepts.
    /// Once the script runs out every send is accepted.
    pub failures: Mutex<VecDeque<Option<QueueError>>>,
    pub count: u64,
}

impl RecordingQueue {
    pub fn failing_with(errors: Vec<Option<QueueError>>) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<QueueMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MessageQueue for RecordingQueue {
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError> {
        if let Some(Some(error)) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError> {
        Ok(None)
    }

    async fn messages_count(&self) -> Result<u64, QueueError> {
        Ok(self.count)
    }

    async fn close(&self) {}
}

/// Runner returning a canned outcome.
pub struct StubRunner {
    pub outcome: Result<Vec<Problem>, AnalysisFailure>,
    pub budgets: Mutex<Vec<Duration>>,
}

impl StubRunner {
    pub fn returning(outcome: Result<Vec<Problem>, AnalysisFailure>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            budgets: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl AnalysisRunner for StubRunner {
    async fn run(
        &self,
        _unit: &scanhub::domain::WorkUnit,
        budget: Duration,
    ) -> Result<Vec<Problem>, AnalysisFailure> {
        self.budgets.lock().unwrap().push(budget);
        self.outcome.clone()
    }

    fn version(&self) -> String {
        "4.2.0".to_string()
    }
}
