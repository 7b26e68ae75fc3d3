use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{IssueData, IssueErrorType, IssueReporter, IssueReporterError};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Repository the reporter files issues against.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_base: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Added to titles as `[environment]` and, for `browser`, as a label.
    pub environment: Option<String>,
    pub production: bool,
}

/// Keeps one open issue per url and error type: new failures comment on the
/// matching issue or open one, a clean scan closes every open issue for the url.
pub struct GithubIssueReporter {
    client: Client,
    settings: GithubSettings,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

#[derive(Serialize)]
struct CreateIssue<'a> {
    title: String,
    body: String,
    labels: &'a [String],
}

#[derive(Serialize)]
struct Comment {
    body: String,
}

impl GithubIssueReporter {
    pub fn new(settings: GithubSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.settings.api_base, self.settings.owner, self.settings.repo, path
        )
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, IssueReporterError> {
        let response = request
            .bearer_auth(&self.settings.token)
            .header("accept", "application/vnd.github.v3+json")
            .header("user-agent", "scanhub")
            .send()
            .await
            .map_err(|e| IssueReporterError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IssueReporterError::UnexpectedResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    async fn search_open_issues(&self, url: &str) -> Result<Vec<SearchItem>, IssueReporterError> {
        let query = format!(
            "{} in:title is:open repo:{}/{}",
            url, self.settings.owner, self.settings.repo
        );
        let request = self
            .client
            .get(format!("{}/search/issues", self.settings.api_base))
            .query(&[("q", query)]);

        let response: SearchResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| IssueReporterError::UnexpectedResponse(e.to_string()))?;

        Ok(response.items)
    }

    async fn edit_issue(&self, number: u64, patch: serde_json::Value) -> Result<(), IssueReporterError> {
        let request = self
            .client
            .patch(self.repo_url(&format!("/issues/{number}")))
            .json(&patch);
        self.send(request).await?;
        Ok(())
    }

    async fn comment(&self, number: u64, issue: &IssueData) -> Result<(), IssueReporterError> {
        let request = self
            .client
            .post(self.repo_url(&format!("/issues/{number}/comments")))
            .json(&Comment {
                body: issue_body(issue),
            });
        self.send(request).await?;
        Ok(())
    }

    async fn open_issue(&self, issue: &IssueData) -> Result<(), IssueReporterError> {
        let mut labels = vec![scan_label(&issue.scan), error_type_label(issue.error_type)];
        if self.settings.production {
            labels.push("production".to_string());
        }
        if self.settings.environment.as_deref() == Some("browser") {
            labels.push("browser".to_string());
        }

        let request = self.client.post(self.repo_url("/issues")).json(&CreateIssue {
            title: issue_title(issue, self.settings.environment.as_deref()),
            body: issue_body(issue),
            labels: &labels,
        });
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueReporter for GithubIssueReporter {
    #[tracing::instrument(skip(self, issue), fields(url = %issue.url))]
    async fn report(&self, issue: &IssueData) -> Result<(), IssueReporterError> {
        let open = self.search_open_issues(&issue.url).await?;

        let Some(error_type) = issue.error_type else {
            for item in &open {
                self.edit_issue(item.number, serde_json::json!({ "state": "closed" }))
                    .await?;
            }
            tracing::debug!(closed = open.len(), "Closed issues for clean scan");
            return Ok(());
        };

        let wanted = error_type_label(Some(error_type));
        for item in &open {
            let mut labels: Vec<String> = item.labels.iter().map(|l| l.name.clone()).collect();
            if labels.contains(&wanted) {
                self.comment(item.number, issue).await?;
                labels.push(scan_label(&issue.scan));
                self.edit_issue(item.number, serde_json::json!({ "labels": labels }))
                    .await?;
                return Ok(());
            }
        }

        self.open_issue(issue).await
    }
}

pub fn error_type_label(error_type: Option<IssueErrorType>) -> String {
    match error_type {
        Some(t) => format!("error:{}", t.as_str()),
        None => "error:unknown".to_string(),
    }
}

pub fn scan_label(scan: &str) -> String {
    format!("scan:{scan}")
}

pub fn issue_title(issue: &IssueData, environment: Option<&str>) -> String {
    let marker = match issue.error_type {
        Some(IssueErrorType::Crash) => "💥",
        Some(IssueErrorType::Timeout) => "⏰",
        _ => "stderr",
    };
    match environment {
        Some(env) => format!("[{marker}] [{env}] {}", issue.url),
        None => format!("[{marker}] {}", issue.url),
    }
}

/// Markdown body with the error, the configurations and the analyzer log.
pub fn issue_body(issue: &IssueData) -> String {
    let mut body = String::new();

    if let Some(message) = issue.error_message.as_deref().filter(|m| !m.is_empty()) {
        body.push_str(&format!("\n## Error:\n\n```bash\n{message}\n```\n"));
    }

    let configs = serde_json::to_string_pretty(&issue.configs).unwrap_or_default();
    body.push_str(&format!("\n## Configuration:\n\n```json\n{configs}\n```\n"));
    body.push_str(&format!(
        "\n## Log:\n\n```json\n{}\n```\n",
        issue.log.as_deref().unwrap_or_default()
    ));

    body
}
