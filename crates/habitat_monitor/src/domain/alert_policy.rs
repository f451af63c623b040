use chrono::{DateTime, Duration, Utc};
use common::domain::{AlertDestination, AlertEvent, Breach, HabitatEnvelope, Reading};

/// Default minimum spacing between two alerts.
pub const DEFAULT_ALERT_COOLDOWN_SECS: i64 = 1800;

/// Mutable alerting state shared by every evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertState {
    /// `None` until the first alert; the first breach always alerts.
    pub last_alert_at: Option<DateTime<Utc>>,
    /// Alerts are suppressed entirely while unset.
    pub destination: Option<AlertDestination>,
}

/// Decides whether a reading should raise an alert.
///
/// The cooldown is global: one alert of any kind blocks every other kind until it elapses.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    envelope: HabitatEnvelope,
    cooldown: Duration,
}

impl AlertPolicy {
    pub fn new(envelope: HabitatEnvelope, cooldown: Duration) -> Self {
        Self { envelope, cooldown }
    }

    pub fn envelope(&self) -> &HabitatEnvelope {
        &self.envelope
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns the alert to send, if any, and advances `last_alert_at` to `now` when it does.
    ///
    /// The cooldown advances at decision time whatever later happens to the delivery.
    pub fn evaluate(
        &self,
        reading: &Reading,
        state: &mut AlertState,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let destination = state.destination.clone()?;

        if let Some(last) = state.last_alert_at {
            if now - last < self.cooldown {
                return None;
            }
        }

        let breaches = Breach::detect(&self.envelope, reading.temperature, reading.humidity);
        if breaches.is_empty() {
            return None;
        }

        state.last_alert_at = Some(now);
        Some(AlertEvent {
            destination,
            raised_at: now,
            breaches,
        })
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(
            HabitatEnvelope::default(),
            Duration::seconds(DEFAULT_ALERT_COOLDOWN_SECS),
        )
    }
}
