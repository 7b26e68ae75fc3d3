use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker shared by the worker (when it synthesizes timeout results) and the
/// merge stage (when it detects them).
pub const SLOW_RETURN_MARKER: &str = "webhint didn't return the result fast enough";

pub const TIMEOUT_MESSAGE: &str = "webhint didn't return the result fast enough. Please try later and if the problem continues, contact us.";

pub const GENERIC_ERROR_MESSAGE: &str = "Error in webhint analyzing this hint";

pub const TOO_MANY_ERRORS_MESSAGE: &str =
    "This hint has too many errors, please use webhint locally for more details";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintStatus {
    Pending,
    Pass,
    Warning,
    Error,
    Off,
}

impl HintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintStatus::Pending => "pending",
            HintStatus::Pass => "pass",
            HintStatus::Warning => "warning",
            HintStatus::Error => "error",
            HintStatus::Off => "off",
        }
    }
}

impl fmt::Display for HintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a single finding reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: i64,
    pub column: i64,
    pub element_line: i64,
    pub element_column: i64,
}

impl Location {
    pub fn unknown() -> Self {
        Self {
            line: -1,
            column: -1,
            element_line: -1,
            element_column: -1,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::unknown()
    }
}

/// A typed finding produced by the analyzer for one hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub hint_id: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
}

impl Problem {
    /// A finding with no location or source detail.
    pub fn synthetic(hint: &Hint, message: &str, severity: Severity) -> Self {
        Self {
            hint_id: hint.name.clone(),
            message: message.to_string(),
            severity,
            category: hint.category.clone(),
            location: Location::unknown(),
            resource: None,
            source_code: None,
        }
    }
}

/// Result slot for one named check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub name: String,
    pub category: String,
    pub status: HintStatus,
    #[serde(default)]
    pub messages: Vec<Problem>,
}

impl Hint {
    pub fn pending(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status: HintStatus::Pending,
            messages: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == HintStatus::Pending
    }

    /// True when the first message is the worker's timeout placeholder.
    pub fn is_timeout(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.message.contains(SLOW_RETURN_MARKER))
    }

    /// Replaces every finding with a single "too many errors" placeholder,
    /// keeping the severity of the first finding.
    pub fn truncate_messages(&mut self) {
        let severity = self
            .messages
            .first()
            .map(|m| m.severity)
            .unwrap_or(match self.status {
                HintStatus::Error => Severity::Error,
                _ => Severity::Warning,
            });
        let hint_id = self
            .messages
            .first()
            .map(|m| m.hint_id.clone())
            .unwrap_or_else(|| self.name.clone());

        let mut problem = Problem::synthetic(self, TOO_MANY_ERRORS_MESSAGE, severity);
        problem.hint_id = hint_id;
        self.messages = vec![problem];
    }
}
