mod helpers;

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use helpers::hint_config;
use scanhub::application::ports::{IssueData, IssueErrorType, IssueReporter};
use scanhub::domain::HintSeverity;
use scanhub::infrastructure::issues::{
    GithubIssueReporter, GithubSettings, error_type_label, issue_body, issue_title, scan_label,
};

fn crash_report() -> IssueData {
    IssueData {
        url: "https://example.com/".to_string(),
        scan: "2024-06-01".to_string(),
        error_type: Some(IssueErrorType::Crash),
        error_message: Some("\"boom\"".to_string()),
        configs: Some(vec![hint_config(&[("axe", HintSeverity::Error)])]),
        log: Some("part 1".to_string()),
    }
}

fn clean_report() -> IssueData {
    IssueData {
        error_type: None,
        error_message: None,
        configs: None,
        log: None,
        ..crash_report()
    }
}

#[test]
fn given_error_types_when_labelling_then_labels_name_the_type() {
    assert_eq!(error_type_label(Some(IssueErrorType::Crash)), "error:crash");
    assert_eq!(error_type_label(Some(IssueErrorType::Timeout)), "error:timeout");
    assert_eq!(error_type_label(None), "error:unknown");
    assert_eq!(scan_label("2024-06-01"), "scan:2024-06-01");
}

#[test]
fn given_issue_when_building_title_then_marker_and_environment_prefix_the_url() {
    let crash = crash_report();
    let timeout = IssueData {
        error_type: Some(IssueErrorType::Timeout),
        ..crash_report()
    };
    let stderr = IssueData {
        error_type: Some(IssueErrorType::Stderr),
        ..crash_report()
    };

    assert_eq!(issue_title(&crash, None), "[💥] https://example.com/");
    assert_eq!(issue_title(&timeout, Some("browser")), "[⏰] [browser] https://example.com/");
    assert_eq!(issue_title(&stderr, None), "[stderr] https://example.com/");
}

#[test]
fn given_issue_when_building_body_then_error_config_and_log_sections_are_present() {
    let body = issue_body(&crash_report());

    assert!(body.contains("## Error:\n\n```bash\n\"boom\"\n```"));
    assert!(body.contains("## Configuration:"));
    assert!(body.contains("\"axe\": \"error\""));
    assert!(body.contains("## Log:\n\n```json\npart 1\n```"));
}

#[test]
fn given_issue_without_error_message_when_building_body_then_error_section_is_omitted() {
    let body = issue_body(&clean_report());

    assert!(!body.contains("## Error:"));
    assert!(body.contains("## Log:"));
}

/// Minimal stand-in for the tracker API that records every write.
#[derive(Clone)]
struct FakeTracker {
    open_issues: Value,
    writes: Arc<Mutex<Vec<(String, Value)>>>,
}

impl FakeTracker {
    fn new(open_issues: Value) -> Self {
        Self {
            open_issues,
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().unwrap().clone()
    }

    async fn serve(&self) -> String {
        let app = Router::new()
            .route("/search/issues", get(search))
            .route("/repos/{owner}/{repo}/issues", post(create))
            .route("/repos/{owner}/{repo}/issues/{number}", patch(edit))
            .route("/repos/{owner}/{repo}/issues/{number}/comments", post(comment))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn record(&self, what: String, body: Value) {
        self.writes.lock().unwrap().push((what, body));
    }
}

async fn search(State(tracker): State<FakeTracker>) -> Json<Value> {
    Json(json!({ "items": tracker.open_issues }))
}

async fn create(State(tracker): State<FakeTracker>, Json(body): Json<Value>) -> Json<Value> {
    tracker.record("create".to_string(), body);
    Json(json!({ "number": 99 }))
}

async fn edit(
    State(tracker): State<FakeTracker>,
    Path((_, _, number)): Path<(String, String, u64)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    tracker.record(format!("edit {number}"), body);
    Json(json!({}))
}

async fn comment(
    State(tracker): State<FakeTracker>,
    Path((_, _, number)): Path<(String, String, u64)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    tracker.record(format!("comment {number}"), body);
    Json(json!({}))
}

fn reporter(api_base: String) -> GithubIssueReporter {
    GithubIssueReporter::new(GithubSettings {
        api_base,
        token: "token".to_string(),
        owner: "owner".to_string(),
        repo: "scans".to_string(),
        environment: None,
        production: true,
    })
}

#[tokio::test]
async fn given_no_matching_issue_when_reporting_crash_then_issue_is_opened() {
    let tracker = FakeTracker::new(json!([
        { "number": 3, "labels": [{ "name": "error:timeout" }] }
    ]));
    let reporter = reporter(tracker.serve().await);

    reporter.report(&crash_report()).await.unwrap();

    let writes = tracker.writes();
    assert_eq!(writes.len(), 1);
    let (what, body) = &writes[0];
    assert_eq!(what, "create");
    assert_eq!(body["title"], "[💥] https://example.com/");
    assert_eq!(
        body["labels"],
        json!(["scan:2024-06-01", "error:crash", "production"])
    );
}

#[tokio::test]
async fn given_matching_issue_when_reporting_crash_then_it_is_commented_and_relabelled() {
    let tracker = FakeTracker::new(json!([
        { "number": 7, "labels": [{ "name": "error:crash" }, { "name": "scan:2024-05-01" }] }
    ]));
    let reporter = reporter(tracker.serve().await);

    reporter.report(&crash_report()).await.unwrap();

    let writes = tracker.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].0, "comment 7");
    assert!(writes[0].1["body"].as_str().unwrap().contains("## Error:"));
    assert_eq!(writes[1].0, "edit 7");
    assert_eq!(
        writes[1].1["labels"],
        json!(["error:crash", "scan:2024-05-01", "scan:2024-06-01"])
    );
}

#[tokio::test]
async fn given_clean_scan_when_reporting_then_open_issues_are_closed() {
    let tracker = FakeTracker::new(json!([
        { "number": 1, "labels": [] },
        { "number": 2, "labels": [{ "name": "error:timeout" }] }
    ]));
    let reporter = reporter(tracker.serve().await);

    reporter.report(&clean_report()).await.unwrap();

    assert_eq!(
        tracker.writes(),
        vec![
            ("edit 1".to_string(), json!({ "state": "closed" })),
            ("edit 2".to_string(), json!({ "state": "closed" })),
        ]
    );
}

#[tokio::test]
async fn given_unreachable_tracker_when_reporting_then_request_error_is_returned() {
    let reporter = reporter("http://127.0.0.1:9".to_string());

    let result = reporter.report(&crash_report()).await;

    assert!(result.is_err());
}
