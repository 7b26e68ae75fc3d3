use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::application::ports::{AnalysisFailure, AnalysisRunner};
use crate::domain::{ErrorPayload, HintConfig, Problem, WorkUnit};

/// Non-empty stderr lines kept as the crash log.
const LOG_TAIL_LINES: usize = 5;

#[derive(Serialize)]
struct AnalyzerRequest<'a> {
    url: &'a str,
    config: Option<&'a HintConfig>,
}

#[derive(Deserialize)]
struct AnalyzerReply {
    #[serde(default)]
    problems: Vec<Problem>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

/// Runs the analyzer as a child process per unit. The request goes in on
/// stdin as JSON and the reply comes back on stdout; the child is killed at the
/// deadline or whenever the run future is dropped.
pub struct ProcessAnalysisRunner {
    command: String,
    args: Vec<String>,
    version: String,
}

impl ProcessAnalysisRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>, version: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            version: version.into(),
        }
    }
}

#[async_trait::async_trait]
impl AnalysisRunner for ProcessAnalysisRunner {
    #[tracing::instrument(skip(self, unit), fields(job_id = %unit.job.id, command = %self.command))]
    async fn run(&self, unit: &WorkUnit, budget: Duration) -> Result<Vec<Problem>, AnalysisFailure> {
        let request = serde_json::to_vec(&AnalyzerRequest {
            url: &unit.job.url,
            config: unit.config(),
        })
        .map_err(|e| crashed(ErrorPayload::new(e.to_string()), None))?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crashed(ErrorPayload::from_error(&e), None))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drained on its own task so the tail survives a kill at the deadline.
        let stderr_buffer = Arc::new(Mutex::new(Vec::new()));
        let stderr_reader = tokio::spawn(collect(stderr, Arc::clone(&stderr_buffer)));

        let exchange = async {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&request).await?;
                stdin.shutdown().await?;
            }
            let out = read_all(stdout).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out))
        };

        let outcome = tokio::time::timeout(budget, exchange).await;
        let (status, stdout) = match outcome {
            Err(_) => {
                tracing::warn!(budget_secs = budget.as_secs(), "Analyzer over budget, killing");
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "Failed to kill analyzer process");
                }
                stderr_reader.abort();
                let log = stderr_tail(&stderr_buffer);
                return Err(AnalysisFailure::Timeout { log });
            }
            Ok(Err(e)) => {
                stderr_reader.abort();
                return Err(crashed(ErrorPayload::from_error(&e), stderr_tail(&stderr_buffer)));
            }
            Ok(Ok(output)) => output,
        };

        match stderr_reader.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to read analyzer stderr"),
            Err(e) => tracing::warn!(error = %e, "Analyzer stderr reader stopped"),
        }
        let log = stderr_tail(&stderr_buffer);
        let reply = serde_json::from_slice::<AnalyzerReply>(&stdout);

        match reply {
            Ok(AnalyzerReply {
                error: Some(error), ..
            }) => Err(crashed(error, log)),
            Ok(AnalyzerReply { problems, .. }) if status.success() => {
                tracing::debug!(problems = problems.len(), "Analyzer finished");
                Ok(problems)
            }
            _ => {
                let message = log
                    .clone()
                    .unwrap_or_else(|| format!("analyzer exited with {status}"));
                Err(crashed(ErrorPayload::new(message), log))
            }
        }
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}

fn crashed(error: ErrorPayload, log: Option<String>) -> AnalysisFailure {
    AnalysisFailure::Crashed { error, log }
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

async fn collect<R>(stream: Option<R>, sink: Arc<Mutex<Vec<u8>>>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut stream) = stream else {
        return Ok(());
    };
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        if let Ok(mut buffer) = sink.lock() {
            buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

fn stderr_tail(buffer: &Mutex<Vec<u8>>) -> Option<String> {
    let bytes = buffer.lock().map(|b| b.clone()).unwrap_or_default();
    log_tail(&String::from_utf8_lossy(&bytes), LOG_TAIL_LINES)
}

/// Last `lines` non-empty lines, or `None` if there are none.
pub fn log_tail(text: &str, lines: usize) -> Option<String> {
    let kept: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if kept.is_empty() {
        return None;
    }
    let start = kept.len().saturating_sub(lines);
    Some(kept[start..].join("\n"))
}
