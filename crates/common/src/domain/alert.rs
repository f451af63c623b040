use crate::domain::habitat_envelope::HabitatEnvelope;
use crate::domain::reading::celsius_to_fahrenheit;
use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the chat channel alerts are delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertDestination(pub String);

impl AlertDestination {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One way a reading left the alerting envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Breach {
    TemperatureTooLow { current: f64, limit: f64 },
    TemperatureTooHigh { current: f64, limit: f64 },
    HumidityTooLow { current: f64, limit: f64 },
    HumidityTooHigh { current: f64, limit: f64 },
}

impl Breach {
    /// Temperature breaches first, then humidity; at most one of each.
    pub fn detect(envelope: &HabitatEnvelope, temperature: f64, humidity: f64) -> Vec<Breach> {
        let mut breaches = Vec::with_capacity(2);

        if envelope.temperature_too_low(temperature) {
            breaches.push(Breach::TemperatureTooLow {
                current: temperature,
                limit: envelope.temp_min,
            });
        } else if envelope.temperature_too_high(temperature) {
            breaches.push(Breach::TemperatureTooHigh {
                current: temperature,
                limit: envelope.temp_max,
            });
        }

        if envelope.humidity_too_low(humidity) {
            breaches.push(Breach::HumidityTooLow {
                current: humidity,
                limit: envelope.hum_min,
            });
        } else if envelope.humidity_too_high(humidity) {
            breaches.push(Breach::HumidityTooHigh {
                current: humidity,
                limit: envelope.hum_max,
            });
        }

        breaches
    }

    pub fn is_temperature(&self) -> bool {
        matches!(
            self,
            Breach::TemperatureTooLow { .. } | Breach::TemperatureTooHigh { .. }
        )
    }

    fn section(&self) -> String {
        match *self {
            Breach::TemperatureTooLow { current, limit } => format!(
                "❄️ **TEMPERATURE TOO LOW!**\n\
                 Current: {:.1}°C ({:.1}°F)\n\
                 Minimum safe: {:.1}°C ({:.1}°F)\n\
                 Action needed: Provide heat source immediately!\n",
                current,
                celsius_to_fahrenheit(current),
                limit,
                celsius_to_fahrenheit(limit)
            ),
            Breach::TemperatureTooHigh { current, limit } => format!(
                "🔥 **TEMPERATURE TOO HIGH!**\n\
                 Current: {:.1}°C ({:.1}°F)\n\
                 Maximum safe: {:.1}°C ({:.1}°F)\n\
                 Action needed: Provide cooling/shade immediately!\n",
                current,
                celsius_to_fahrenheit(current),
                limit,
                celsius_to_fahrenheit(limit)
            ),
            Breach::HumidityTooLow { current, limit } => format!(
                "🏜️ **HUMIDITY TOO LOW!**\n\
                 Current: {:.1}%\n\
                 Recommended minimum: {:.1}%\n\
                 Action needed: Mist enclosure or provide humid hide!\n",
                current, limit
            ),
            Breach::HumidityTooHigh { current, limit } => format!(
                "💧 **HUMIDITY TOO HIGH!**\n\
                 Current: {:.1}%\n\
                 Recommended maximum: {:.1}%\n\
                 Action needed: Improve ventilation!\n",
                current, limit
            ),
        }
    }
}

/// An alert the policy decided to send. Delivery is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub destination: AlertDestination,
    pub raised_at: DateTime<Utc>,
    pub breaches: Vec<Breach>,
}

impl AlertEvent {
    /// Chat message with one section per breach.
    pub fn message(&self) -> String {
        let mut parts = vec!["🚨 **SULCATA ALERT** 🚨\n".to_string()];
        parts.extend(self.breaches.iter().map(Breach::section));
        parts.join("\n")
    }
}

/// Outbound chat capability: deliver a text message to a channel.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, destination: &AlertDestination, content: &str) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_no_breach_inside_envelope() {
        let envelope = HabitatEnvelope::default();
        assert!(Breach::detect(&envelope, 30.0, 50.0).is_empty());
        // outside the ideal band but inside the alert tolerance
        assert!(Breach::detect(&envelope, 19.0, 32.0).is_empty());
    }

    #[test]
    fn test_detect_both_breaches() {
        let envelope = HabitatEnvelope::default();

        let breaches = Breach::detect(&envelope, 41.0, 80.0);

        assert_eq!(
            breaches,
            vec![
                Breach::TemperatureTooHigh {
                    current: 41.0,
                    limit: 40.0
                },
                Breach::HumidityTooHigh {
                    current: 80.0,
                    limit: 60.0
                },
            ]
        );
        assert!(breaches[0].is_temperature());
        assert!(!breaches[1].is_temperature());
    }

    #[test]
    fn test_message_contains_every_section() {
        let event = AlertEvent {
            destination: AlertDestination::new("123"),
            raised_at: Utc::now(),
            breaches: vec![
                Breach::TemperatureTooLow {
                    current: 15.0,
                    limit: 18.0,
                },
                Breach::HumidityTooLow {
                    current: 25.0,
                    limit: 40.0,
                },
            ],
        };

        let message = event.message();

        assert!(message.starts_with("🚨 **SULCATA ALERT** 🚨"));
        assert!(message.contains("TEMPERATURE TOO LOW!"));
        assert!(message.contains("Current: 15.0°C (59.0°F)"));
        assert!(message.contains("Minimum safe: 18.0°C (64.4°F)"));
        assert!(message.contains("HUMIDITY TOO LOW!"));
        assert!(message.contains("Recommended minimum: 40.0%"));
    }
}
