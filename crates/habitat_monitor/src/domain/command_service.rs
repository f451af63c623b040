use crate::domain::reports::{
    alerts_enabled, help_text, latest_report, no_data_for_window, not_enough_for_window,
    stats_report, sulcata_status_report, NO_DATA_TO_PLOT, NO_DATA_YET, POSITIVE_HOURS,
};
use crate::domain::{
    filter_window, odd_window, stats, AlertService, CommandParseError,
    HabitatCommand, Series, SeriesStore, Smoothing,
};
use chrono::Utc;
use common::domain::{AlertDestination, DomainError, PlotRenderer, PlotRequest, RenderedArtifact};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Where a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub channel_id: String,
    pub channel_name: Option<String>,
}

impl CommandContext {
    fn display_name(&self) -> &str {
        self.channel_name.as_deref().unwrap_or(&self.channel_id)
    }
}

/// Messages to post back, in order, and at most one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandReply {
    pub messages: Vec<String>,
    pub attachment: Option<RenderedArtifact>,
}

impl CommandReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            attachment: None,
        }
    }
}

/// Executes chat commands against the store.
///
/// Every outcome, including bad input and missing data, is a reply; nothing here fails.
pub struct CommandService {
    store: Arc<SeriesStore>,
    alerts: Arc<AlertService>,
    renderer: Arc<dyn PlotRenderer>,
}

impl CommandService {
    pub fn new(
        store: Arc<SeriesStore>,
        alerts: Arc<AlertService>,
        renderer: Arc<dyn PlotRenderer>,
    ) -> Self {
        Self {
            store,
            alerts,
            renderer,
        }
    }

    #[instrument(skip(self, context), fields(channel_id = %context.channel_id))]
    pub async fn handle(&self, context: &CommandContext, content: &str) -> CommandReply {
        match content.parse::<HabitatCommand>() {
            Ok(command) => self.execute(context, command).await,
            Err(e) => {
                debug!(error = %e, "rejected command");
                usage_reply(&e)
            }
        }
    }

    pub async fn execute(&self, context: &CommandContext, command: HabitatCommand) -> CommandReply {
        match command {
            HabitatCommand::Temp => match self.store.latest().await {
                Some(reading) => CommandReply::text(latest_report(&reading)),
                None => CommandReply::text(NO_DATA_YET),
            },
            HabitatCommand::Plot { hours } => self.plot(hours, None).await,
            HabitatCommand::PlotRolling { hours, window } => {
                self.plot(hours, Some(Smoothing::MovingAverage { window }))
                    .await
            }
            HabitatCommand::PlotSavgol {
                hours,
                window,
                poly_order,
            } => {
                self.plot(hours, Some(Smoothing::Polynomial { window, poly_order }))
                    .await
            }
            HabitatCommand::Stats { hours } => self.stats(hours).await,
            HabitatCommand::SulcataStatus => CommandReply::text(self.status_text().await),
            HabitatCommand::SetAlerts => {
                self.alerts
                    .set_destination(AlertDestination::new(context.channel_id.clone()))
                    .await;
                CommandReply {
                    messages: vec![
                        alerts_enabled(context.display_name()),
                        self.status_text().await,
                    ],
                    attachment: None,
                }
            }
            HabitatCommand::Help => CommandReply::text(help_text()),
        }
    }

    async fn status_text(&self) -> String {
        match self.store.latest().await {
            Some(reading) => sulcata_status_report(&reading, self.alerts.envelope()),
            None => NO_DATA_YET.to_string(),
        }
    }

    async fn window(&self, hours: i64, empty_store: &str) -> Result<Series, CommandReply> {
        let series = self.store.snapshot().await;
        if series.is_empty() {
            return Err(CommandReply::text(empty_store));
        }
        if hours <= 0 {
            return Err(CommandReply::text(POSITIVE_HOURS));
        }
        let windowed = filter_window(&series, Utc::now(), hours);
        if windowed.is_empty() {
            return Err(CommandReply::text(no_data_for_window(hours)));
        }
        Ok(windowed)
    }

    async fn stats(&self, hours: i64) -> CommandReply {
        let series = match self.window(hours, NO_DATA_YET).await {
            Ok(series) => series,
            Err(reply) => return reply,
        };
        match stats(&series) {
            Ok(stats) => CommandReply::text(stats_report(hours, &stats)),
            Err(_) => CommandReply::text(no_data_for_window(hours)),
        }
    }

    async fn plot(&self, hours: i64, smoothing: Option<Smoothing>) -> CommandReply {
        let series = match self.window(hours, NO_DATA_TO_PLOT).await {
            Ok(series) => series,
            Err(reply) => return reply,
        };

        let smoothed = match smoothing.map(|s| s.apply(&series)).transpose() {
            Ok(smoothed) => smoothed,
            Err(DomainError::InsufficientData(_)) => {
                let window = match smoothing {
                    Some(Smoothing::Polynomial { window, .. }) => odd_window(window),
                    Some(Smoothing::MovingAverage { window }) => window,
                    None => 0,
                };
                return CommandReply::text(not_enough_for_window(hours, window));
            }
            Err(e) => {
                return CommandReply::text(format!("Error applying {}: {}", filter_name(smoothing), e))
            }
        };

        let (stem, title, caption) = match smoothing {
            None => (
                "weather_plot",
                format!("Weather Data - Last {} Hours", hours),
                format!("📊 **Weather data for the last {} hours:**", hours),
            ),
            Some(Smoothing::MovingAverage { window }) => (
                "weather_plot_rolling",
                format!(
                    "Weather Data - Last {} Hours (Rolling Average, Window={})",
                    hours, window
                ),
                format!(
                    "📊 **Smoothed weather data (rolling average) for the last {} hours:**",
                    hours
                ),
            ),
            Some(Smoothing::Polynomial { window, .. }) => (
                "weather_plot_savgol",
                format!(
                    "Weather Data - Last {} Hours (Savitzky-Golay, Window={})",
                    hours,
                    odd_window(window)
                ),
                format!(
                    "📊 **Smoothed weather data (Savitzky-Golay) for the last {} hours:**",
                    hours
                ),
            ),
        };

        let request = PlotRequest {
            title,
            timestamps: series.timestamps(),
            temperature: series.temperatures(),
            humidity: series.humidities(),
            smoothed,
        };
        match self.renderer.render(&request, stem) {
            Ok(artifact) => CommandReply {
                messages: vec![caption],
                attachment: Some(artifact),
            },
            Err(e) => {
                error!(error = %e, "failed to render plot");
                CommandReply::text(format!("Error rendering plot: {}", e))
            }
        }
    }
}

fn filter_name(smoothing: Option<Smoothing>) -> &'static str {
    match smoothing {
        Some(Smoothing::Polynomial { .. }) => "Savitzky-Golay filter",
        Some(Smoothing::MovingAverage { .. }) => "rolling average",
        None => "plot",
    }
}

fn usage_reply(error: &CommandParseError) -> CommandReply {
    match error {
        CommandParseError::NotACommand | CommandParseError::Unknown(_) => {
            CommandReply::text("Unknown command. Type `!help_weather` to see the available commands.")
        }
        CommandParseError::BadArgument { usage, .. }
        | CommandParseError::TooManyArguments { usage, .. } => {
            CommandReply::text(format!("Usage: `{}`", usage))
        }
    }
}
