mod github_issue_reporter;
mod noop_issue_reporter;

pub use github_issue_reporter::{
    DEFAULT_GITHUB_API, GithubIssueReporter, GithubSettings, error_type_label, issue_body,
    issue_title, scan_label,
};
pub use noop_issue_reporter::NoopIssueReporter;
