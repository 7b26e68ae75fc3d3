use std::collections::BTreeMap;

/// Named event with string properties and numeric measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryEvent {
    pub name: String,
    pub properties: BTreeMap<String, String>,
    pub measurements: BTreeMap<String, f64>,
}

impl TelemetryEvent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

pub trait Telemetry: Send + Sync {
    fn track_event(&self, event: TelemetryEvent);

    fn track_exception(&self, message: &str);
}
