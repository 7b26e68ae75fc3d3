use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity a configuration assigns to a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintSeverity {
    Off,
    Warning,
    Error,
}

/// A hint entry is either a bare severity or `[severity, options]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintSetting {
    Level(HintSeverity),
    Detailed(HintSeverity, serde_json::Value),
}

impl HintSetting {
    pub fn severity(&self) -> HintSeverity {
        match self {
            HintSetting::Level(s) | HintSetting::Detailed(s, _) => *s,
        }
    }

    pub fn is_off(&self) -> bool {
        self.severity() == HintSeverity::Off
    }
}

/// One analyzer configuration. Compared by value, so unknown analyzer options
/// are kept verbatim in `options`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default)]
    pub hints: BTreeMap<String, HintSetting>,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl HintConfig {
    pub fn with_hints<I, S>(hints: I) -> Self
    where
        I: IntoIterator<Item = (S, HintSeverity)>,
        S: Into<String>,
    {
        Self {
            extends: Vec::new(),
            hints: hints
                .into_iter()
                .map(|(name, severity)| (name.into(), HintSetting::Level(severity)))
                .collect(),
            options: serde_json::Map::new(),
        }
    }

    pub fn extending<I, S>(mut self, extends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extends = extends.into_iter().map(Into::into).collect();
        self
    }
}
