use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ErrorPayload, HintConfig, Problem, WorkUnit};

/// Executes one work unit in an isolated context that is hard-killed at the
/// deadline.
#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    async fn run(&self, unit: &WorkUnit, budget: Duration) -> Result<Vec<Problem>, AnalysisFailure>;

    /// Version string of the analyzer, stamped on `started` messages.
    fn version(&self) -> String;
}

/// The website analyzer itself, invoked in-process by a supervising runner.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, url: &str, config: &HintConfig) -> Result<Vec<Problem>, ErrorPayload>;

    fn version(&self) -> String;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisFailure {
    #[error("TIMEOUT")]
    Timeout { log: Option<String> },
    #[error("analysis crashed: {}", error.message)]
    Crashed {
        error: ErrorPayload,
        log: Option<String>,
    },
}

impl AnalysisFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalysisFailure::Timeout { .. })
    }

    pub fn log(&self) -> Option<&str> {
        match self {
            AnalysisFailure::Timeout { log } | AnalysisFailure::Crashed { log, .. } => {
                log.as_deref()
            }
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        match self {
            AnalysisFailure::Timeout { .. } => ErrorPayload::new("TIMEOUT"),
            AnalysisFailure::Crashed { error, .. } => error.clone(),
        }
    }
}
