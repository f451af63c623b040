use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines (false for human readable output)
    #[serde(default = "default_log_json")]
    pub log_json: bool,

    // HTTP configuration
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // Storage configuration
    /// JSON file holding the last checkpoint
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Readings kept in memory; the oldest are dropped beyond this
    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,

    /// Write a checkpoint every N readings (0 disables periodic checkpoints)
    #[serde(default = "default_flush_every")]
    pub flush_every: u64,

    // Alert configuration
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: i64,

    /// Channel alerts go to until `!set_alerts` picks another one
    #[serde(default)]
    pub alert_channel_id: Option<String>,

    /// Webhook receiving alerts; alerts are only logged when unset
    #[serde(default)]
    pub alert_webhook_url: Option<String>,

    #[serde(default = "default_alert_dispatch_timeout_secs")]
    pub alert_dispatch_timeout_secs: u64,

    /// Give the cooldown back when an alert could not be delivered
    #[serde(default)]
    pub alert_rearm_on_dispatch_failure: bool,

    // Habitat envelope
    #[serde(default = "default_temp_min")]
    pub temp_min: f64,

    #[serde(default = "default_temp_ideal_min")]
    pub temp_ideal_min: f64,

    #[serde(default = "default_temp_ideal_max")]
    pub temp_ideal_max: f64,

    #[serde(default = "default_temp_max")]
    pub temp_max: f64,

    #[serde(default = "default_hum_min")]
    pub hum_min: f64,

    #[serde(default = "default_hum_max")]
    pub hum_max: f64,

    #[serde(default = "default_hum_alert_margin_low")]
    pub hum_alert_margin_low: f64,

    #[serde(default = "default_hum_alert_margin_high")]
    pub hum_alert_margin_high: f64,

    /// Time allowed for the final checkpoint on shutdown
    #[serde(default = "default_closer_timeout_secs")]
    pub closer_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_json() -> bool {
    true
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_data_file() -> String {
    "data/sensor_data.json".to_string()
}

fn default_max_data_points() -> usize {
    10_000
}

fn default_flush_every() -> u64 {
    10
}

fn default_alert_cooldown_secs() -> i64 {
    1800
}

fn default_alert_dispatch_timeout_secs() -> u64 {
    10
}

fn default_temp_min() -> f64 {
    18.0
}

fn default_temp_ideal_min() -> f64 {
    27.0
}

fn default_temp_ideal_max() -> f64 {
    35.0
}

fn default_temp_max() -> f64 {
    40.0
}

fn default_hum_min() -> f64 {
    40.0
}

fn default_hum_max() -> f64 {
    60.0
}

fn default_hum_alert_margin_low() -> f64 {
    10.0
}

fn default_hum_alert_margin_high() -> f64 {
    15.0
}

fn default_closer_timeout_secs() -> u64 {
    10
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("HABITAT"))
            .build()?
            .try_deserialize()
    }

    /// Initial alert destination, with an empty channel id meaning none.
    pub fn alert_channel(&self) -> Option<&str> {
        self.alert_channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.alert_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "HABITAT_LOG_LEVEL",
        "HABITAT_HTTP_PORT",
        "HABITAT_FLUSH_EVERY",
        "HABITAT_ALERT_CHANNEL_ID",
        "HABITAT_TEMP_MAX",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: Test runs with mutex lock to prevent concurrent env access
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.data_file, "data/sensor_data.json");
        assert_eq!(config.max_data_points, 10_000);
        assert_eq!(config.flush_every, 10);
        assert_eq!(config.alert_cooldown_secs, 1800);
        assert_eq!(config.temp_max, 40.0);
        assert!(config.alert_channel().is_none());
        assert!(config.webhook_url().is_none());
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("HABITAT_LOG_LEVEL", "debug");
            std::env::set_var("HABITAT_HTTP_PORT", "9001");
            std::env::set_var("HABITAT_FLUSH_EVERY", "25");
            std::env::set_var("HABITAT_ALERT_CHANNEL_ID", "1234");
            std::env::set_var("HABITAT_TEMP_MAX", "38.5");
        }

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http_port, 9001);
        assert_eq!(config.flush_every, 25);
        assert_eq!(config.alert_channel(), Some("1234"));
        assert_eq!(config.temp_max, 38.5);

        clear_env();
    }

    #[test]
    fn test_blank_channel_is_unset() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("HABITAT_ALERT_CHANNEL_ID", "  ");
        }

        let config = ServiceConfig::from_env().unwrap();
        assert!(config.alert_channel().is_none());

        clear_env();
    }
}
