mod helpers;

use helpers::{hint_config, job_with_hints, problem};
use scanhub::domain::{
    ErrorPayload, Hint, HintConfig, HintSetting, HintSeverity, HintStatus, JobStatus,
    SLOW_RETURN_MARKER, Severity, TIMEOUT_MESSAGE, TOO_MANY_ERRORS_MESSAGE, WorkUnit,
};

#[test]
fn given_status_machine_when_checking_edges_then_only_forward_moves_are_allowed() {
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Started));
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Finished));
    assert!(JobStatus::Started.can_transition_to(JobStatus::Error));
    assert!(JobStatus::Finished.can_transition_to(JobStatus::Error));
    assert!(JobStatus::Finished.can_transition_to(JobStatus::Finished));

    assert!(!JobStatus::Started.can_transition_to(JobStatus::Pending));
    assert!(!JobStatus::Finished.can_transition_to(JobStatus::Started));
    assert!(!JobStatus::Error.can_transition_to(JobStatus::Finished));
    assert!(!JobStatus::Error.can_transition_to(JobStatus::Pending));
}

#[test]
fn given_status_strings_when_parsing_then_lowercase_names_round_trip() {
    for status in [
        JobStatus::Pending,
        JobStatus::Started,
        JobStatus::Finished,
        JobStatus::Error,
    ] {
        assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
    }
    assert!("done".parse::<JobStatus>().is_err());
}

#[test]
fn given_job_with_three_configs_when_splitting_then_each_unit_carries_one_config() {
    let configs = vec![
        hint_config(&[("axe", HintSeverity::Error)]),
        hint_config(&[("http-cache", HintSeverity::Warning)]),
        hint_config(&[("css-prefix-order", HintSeverity::Error)]),
    ];
    let job = job_with_hints(
        "https://example.com/",
        &["axe", "http-cache", "css-prefix-order"],
        configs.clone(),
    );

    let units = WorkUnit::split(&job);

    assert_eq!(units.len(), 3);
    for (index, unit) in units.iter().enumerate() {
        assert_eq!(unit.part_info.part, index as u32 + 1);
        assert_eq!(unit.part_info.total_parts, 3);
        assert_eq!(unit.job.config, vec![configs[index].clone()]);
        assert_eq!(unit.job.id, job.id);
        assert_eq!(unit.job.hints, job.hints);
    }
}

#[test]
fn given_timeout_placeholder_when_checking_hint_then_it_is_a_timeout() {
    let mut hint = Hint::pending("axe", "accessibility");
    assert!(!hint.is_timeout());

    hint.status = HintStatus::Warning;
    hint.messages = vec![problem("axe", Severity::Warning, TIMEOUT_MESSAGE)];

    assert!(hint.is_timeout());
    assert!(TIMEOUT_MESSAGE.contains(SLOW_RETURN_MARKER));
}

#[test]
fn given_timeout_placeholder_after_other_findings_when_checking_hint_then_it_is_not_a_timeout() {
    let mut hint = Hint::pending("axe", "accessibility");
    hint.messages = vec![
        problem("axe", Severity::Error, "missing alt"),
        problem("axe", Severity::Warning, TIMEOUT_MESSAGE),
    ];

    assert!(!hint.is_timeout());
}

#[test]
fn given_many_findings_when_truncating_then_one_placeholder_keeps_first_severity() {
    let mut hint = Hint::pending("axe", "accessibility");
    hint.status = HintStatus::Error;
    hint.messages = vec![
        problem("axe", Severity::Warning, "first"),
        problem("axe", Severity::Error, "second"),
    ];

    hint.truncate_messages();

    assert_eq!(hint.messages.len(), 1);
    assert_eq!(hint.messages[0].message, TOO_MANY_ERRORS_MESSAGE);
    assert_eq!(hint.messages[0].severity, Severity::Warning);
    assert_eq!(hint.messages[0].location.line, -1);
    assert_eq!(hint.messages[0].resource, None);
}

#[test]
fn given_analyzer_config_json_when_deserializing_then_unknown_options_are_kept() {
    let raw = r#"{
        "extends": ["web-recommended"],
        "hints": {
            "axe": "error",
            "http-cache": ["warning", {"maxAge": 300}],
            "css-prefix-order": "off"
        },
        "connector": {"name": "puppeteer"},
        "ignoredUrls": []
    }"#;

    let config: HintConfig = serde_json::from_str(raw).unwrap();

    assert_eq!(config.extends, vec!["web-recommended".to_string()]);
    assert_eq!(config.hints["axe"], HintSetting::Level(HintSeverity::Error));
    assert_eq!(config.hints["http-cache"].severity(), HintSeverity::Warning);
    assert!(config.hints["css-prefix-order"].is_off());
    assert_eq!(
        config.options["connector"],
        serde_json::json!({"name": "puppeteer"})
    );
    assert!(config.options.contains_key("ignoredUrls"));

    let again: HintConfig = serde_json::from_value(serde_json::to_value(&config).unwrap()).unwrap();
    assert_eq!(again, config);
}

#[test]
fn given_configs_differing_only_in_options_when_comparing_then_they_differ() {
    let mut a = hint_config(&[("axe", HintSeverity::Error)]);
    let b = a.clone();
    a.options
        .insert("browser".to_string(), serde_json::json!("Chrome"));

    assert_ne!(a, b);
}

#[test]
fn given_error_with_source_when_building_payload_then_chain_becomes_stack() {
    let outer = OuterError(std::io::Error::other("disk full"));

    let payload = ErrorPayload::from_error(&outer);

    assert_eq!(payload.message, "write failed");
    assert_eq!(payload.stack.as_deref(), Some("disk full"));
}

#[derive(Debug)]
struct OuterError(std::io::Error);

impl std::fmt::Display for OuterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "write failed")
    }
}

impl std::error::Error for OuterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}
