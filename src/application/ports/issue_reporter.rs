use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::HintConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueErrorType {
    Crash,
    Stderr,
    Timeout,
}

impl IssueErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueErrorType::Crash => "crash",
            IssueErrorType::Stderr => "stderr",
            IssueErrorType::Timeout => "timeout",
        }
    }
}

impl fmt::Display for IssueErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to tell the issue tracker about a scan. No `error_type` means the url
/// scanned cleanly and its open issues should be closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueData {
    pub url: String,
    /// Scan date, `YYYY-MM-DD`.
    pub scan: String,
    pub error_type: Option<IssueErrorType>,
    pub error_message: Option<String>,
    pub configs: Option<Vec<HintConfig>>,
    pub log: Option<String>,
}

#[async_trait]
pub trait IssueReporter: Send + Sync {
    async fn report(&self, issue: &IssueData) -> Result<(), IssueReporterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IssueReporterError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
