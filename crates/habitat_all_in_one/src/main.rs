mod config;

use common::domain::{AlertDestination, HabitatEnvelope, MessageSink};
use common::telemetry::{init_telemetry, TelemetryConfig};
use crate::config::ServiceConfig;
use habitat_monitor::{
    HabitatMonitor, HabitatMonitorConfig, HttpServerConfig, JsonFileSeriesRepository,
    LogMessageSink, SvgPlotRenderer, WebhookMessageSink,
};
use habitat_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        service_name: "habitat-all-in-one".to_string(),
        log_level: config.log_level.clone(),
        json: config.log_json,
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    let envelope = HabitatEnvelope {
        temp_min: config.temp_min,
        temp_ideal_min: config.temp_ideal_min,
        temp_ideal_max: config.temp_ideal_max,
        temp_max: config.temp_max,
        hum_min: config.hum_min,
        hum_max: config.hum_max,
        hum_alert_margin_low: config.hum_alert_margin_low,
        hum_alert_margin_high: config.hum_alert_margin_high,
    };
    if let Err(e) = envelope.check() {
        eprintln!("Invalid habitat envelope: {}", e);
        std::process::exit(1);
    }

    info!(
        http_port = config.http_port,
        data_file = %config.data_file,
        "Starting habitat-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let dispatch_timeout = Duration::from_secs(config.alert_dispatch_timeout_secs);
    let sink: Arc<dyn MessageSink> = match config.webhook_url() {
        Some(url) => match WebhookMessageSink::new(url, dispatch_timeout) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                error!("Failed to initialize alert webhook: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No alert webhook configured, alerts will only be logged");
            Arc::new(LogMessageSink)
        }
    };

    let monitor = HabitatMonitor::new(
        HabitatMonitorConfig {
            http: HttpServerConfig {
                host: config.http_host.clone(),
                port: config.http_port,
            },
            max_data_points: config.max_data_points,
            flush_every: config.flush_every,
            envelope,
            alert_cooldown: chrono::Duration::seconds(config.alert_cooldown_secs),
            alert_destination: config.alert_channel().map(AlertDestination::new),
            dispatch_timeout,
            rearm_on_dispatch_failure: config.alert_rearm_on_dispatch_failure,
        },
        Arc::new(JsonFileSeriesRepository::new(config.data_file.clone())),
        sink,
        Arc::new(SvgPlotRenderer::new()),
    );

    let restored = monitor.restore().await;
    info!(data_points = restored, "Loaded stored readings");

    let checkpoint = monitor.checkpoint_closer();

    Runner::new()
        .with_named_process("habitat_monitor", monitor.into_runner_process())
        .with_closer(checkpoint)
        .with_closer_timeout(Duration::from_secs(config.closer_timeout_secs))
        .run()
        .await;
}
