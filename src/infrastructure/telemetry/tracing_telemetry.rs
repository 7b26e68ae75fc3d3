use crate::application::ports::{Telemetry, TelemetryEvent};

/// Emits telemetry as structured log records under the `telemetry` target.
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn track_event(&self, event: TelemetryEvent) {
        let properties = serde_json::to_string(&event.properties).unwrap_or_default();
        let measurements = serde_json::to_string(&event.measurements).unwrap_or_default();
        tracing::info!(
            target: "telemetry",
            event = %event.name,
            properties = %properties,
            measurements = %measurements,
            "Telemetry event"
        );
    }

    fn track_exception(&self, message: &str) {
        tracing::error!(target: "telemetry", exception = %message, "Telemetry exception");
    }
}
