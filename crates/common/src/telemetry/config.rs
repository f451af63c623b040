/// Configuration for telemetry initialization
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    /// JSON lines when true, human readable output otherwise.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "habitat-monitor".to_string(),
            log_level: "info".to_string(),
            json: true,
        }
    }
}
