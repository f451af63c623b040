//! Human-readable chat texts built from readings and query results.

use crate::domain::SeriesStats;
use common::domain::{
    celsius_to_fahrenheit, HabitatEnvelope, HumidityBand, Reading, TemperatureBand,
};

pub const NO_DATA_YET: &str = "No data available yet!";
pub const NO_DATA_TO_PLOT: &str = "No data available to plot!";
pub const POSITIVE_HOURS: &str = "Please specify a positive number of hours.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn no_data_for_window(hours: i64) -> String {
    format!("No data available for the last {} hours.", hours)
}

pub fn not_enough_for_window(hours: i64, window: usize) -> String {
    format!(
        "Not enough data available for the last {} hours to use window size {}.",
        hours, window
    )
}

pub fn latest_report(reading: &Reading) -> String {
    format!(
        "🌡️ **Weather Station Report**\n\
         🕒 Time: {}\n\
         🌡️ Temperature: {:.1}°C\n\
         💧 Humidity: {:.1}%",
        reading.occurred_at.format(TIMESTAMP_FORMAT),
        reading.temperature,
        reading.humidity
    )
}

pub fn stats_report(hours: i64, stats: &SeriesStats) -> String {
    format!(
        "📊 **Weather Statistics (Last {} hours)**\n\n\
         **Temperature:**\n\
         - Minimum: {:.1}°C\n\
         - Maximum: {:.1}°C\n\
         - Average: {:.1}°C\n\n\
         **Humidity:**\n\
         - Minimum: {:.1}%\n\
         - Maximum: {:.1}%\n\
         - Average: {:.1}%",
        hours,
        stats.temperature.min,
        stats.temperature.max,
        stats.temperature.mean,
        stats.humidity.min,
        stats.humidity.max,
        stats.humidity.mean
    )
}

fn temperature_verdict(band: TemperatureBand) -> (&'static str, &'static str) {
    match band {
        TemperatureBand::TooCold => (
            "❄️ **TOO COLD!** Your sulcata needs more heat immediately!",
            "Turn on heating equipment and monitor temperature closely.",
        ),
        TemperatureBand::Cool => (
            "🥶 **Too Cool** - Below ideal temperature",
            "Consider providing additional heat source.",
        ),
        TemperatureBand::Ideal => (
            "✅ **Perfect** - Ideal temperature range",
            "Temperature is perfect for your sulcata.",
        ),
        TemperatureBand::Warm => (
            "🥵 **Too Warm** - Above ideal temperature",
            "Consider providing shade/cooling.",
        ),
        TemperatureBand::TooHot => (
            "🔥 **TOO HOT!** Your sulcata needs cooling immediately!",
            "Move to cooler area or provide shade/cooling immediately!",
        ),
    }
}

fn humidity_verdict(band: HumidityBand) -> (&'static str, &'static str) {
    match band {
        HumidityBand::Dry => (
            "🏜️ **Too Dry** - Below ideal humidity",
            "Consider misting or providing humid hide.",
        ),
        HumidityBand::Ideal => (
            "✅ **Perfect** - Ideal humidity range",
            "Humidity is perfect for your sulcata.",
        ),
        HumidityBand::Humid => (
            "💧 **Too Humid** - Above ideal humidity",
            "Provide better ventilation or drier areas.",
        ),
    }
}

pub fn sulcata_status_report(reading: &Reading, envelope: &HabitatEnvelope) -> String {
    let (temp_status, temp_advice) =
        temperature_verdict(envelope.classify_temperature(reading.temperature));
    let (hum_status, hum_advice) = humidity_verdict(envelope.classify_humidity(reading.humidity));

    format!(
        "🐢 **Sulcata Tortoise Environment Status** (as of {})\n\n\
         **Temperature: {:.1}°C ({:.1}°F)**\n\
         {}\n\
         {}\n\n\
         **Humidity: {:.1}%**\n\
         {}\n\
         {}\n\n\
         **Ideal Environment:**\n\
         Temperature: {:.1}-{:.1}°C ({:.1}-{:.1}°F)\n\
         Humidity: {:.1}-{:.1}%",
        reading.occurred_at.format(TIMESTAMP_FORMAT),
        reading.temperature,
        reading.temperature_fahrenheit(),
        temp_status,
        temp_advice,
        reading.humidity,
        hum_status,
        hum_advice,
        envelope.temp_ideal_min,
        envelope.temp_ideal_max,
        celsius_to_fahrenheit(envelope.temp_ideal_min),
        celsius_to_fahrenheit(envelope.temp_ideal_max),
        envelope.hum_min,
        envelope.hum_max
    )
}

pub fn alerts_enabled(channel_name: &str) -> String {
    format!(
        "✅ Alert channel set to **#{}**\n\
         You will receive alerts in this channel when conditions are not suitable for your sulcata tortoise.",
        channel_name
    )
}

pub fn help_text() -> String {
    "**Weather Station Bot Commands:**\n\n\
     - `!temp` - Show current temperature and humidity\n\
     - `!sulcata_status` - Check if conditions are suitable for sulcata tortoise\n\
     - `!set_alerts` - Set current channel for automatic alerts\n\
     - `!plot [hours]` - Generate a plot for the specified hours (default: 24)\n\
     - `!plot_rolling [hours] [window]` - Plot with a rolling average (defaults: 24, 5)\n\
     - `!plot_savgol [hours] [window] [poly]` - Plot with Savitzky-Golay smoothing (defaults: 24, 7, 3)\n\
     - `!stats [hours]` - Show statistics for the specified hours (default: 24)\n\
     - `!help_weather` - Show this help message"
        .to_string()
}
