use async_trait::async_trait;

use crate::application::ports::{IssueData, IssueReporter, IssueReporterError};

/// Used when no issue tracker is configured.
pub struct NoopIssueReporter;

#[async_trait]
impl IssueReporter for NoopIssueReporter {
    async fn report(&self, issue: &IssueData) -> Result<(), IssueReporterError> {
        tracing::debug!(url = %issue.url, error_type = ?issue.error_type, "Issue report skipped");
        Ok(())
    }
}
