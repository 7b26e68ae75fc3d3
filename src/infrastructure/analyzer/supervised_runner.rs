use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{AnalysisFailure, AnalysisRunner, Analyzer};
use crate::domain::{ErrorPayload, Problem, WorkUnit};

/// Runs an in-process analyzer on its own task and aborts it at the deadline.
/// A panic inside the analyzer is reported as a crash.
pub struct SupervisedAnalysisRunner {
    analyzer: Arc<dyn Analyzer>,
}

impl SupervisedAnalysisRunner {
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait::async_trait]
impl AnalysisRunner for SupervisedAnalysisRunner {
    async fn run(&self, unit: &WorkUnit, budget: Duration) -> Result<Vec<Problem>, AnalysisFailure> {
        let analyzer = Arc::clone(&self.analyzer);
        let url = unit.job.url.clone();
        let config = unit.config().cloned().unwrap_or_default();

        let mut task = tokio::spawn(async move { analyzer.analyze(&url, &config).await });

        match tokio::time::timeout(budget, &mut task).await {
            Err(_) => {
                task.abort();
                tracing::warn!(job_id = %unit.job.id, "Analysis aborted at deadline");
                Err(AnalysisFailure::Timeout { log: None })
            }
            Ok(Ok(Ok(problems))) => Ok(problems),
            Ok(Ok(Err(error))) => Err(AnalysisFailure::Crashed { error, log: None }),
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                Err(AnalysisFailure::Crashed {
                    error: ErrorPayload::new(message),
                    log: None,
                })
            }
        }
    }

    fn version(&self) -> String {
        self.analyzer.version()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "analyzer panicked".to_string()),
    }
}
