use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Upper bound on retained readings unless configured otherwise.
pub const MAX_DATA_POINTS: usize = 10_000;

/// Payload keys with a fixed meaning; everything else lands in `extra`.
pub const TEMPERATURE_KEY: &str = "temp";
pub const HUMIDITY_KEY: &str = "hum";
pub const TIME_KEY: &str = "time";

/// One stored sample. Immutable once appended to the series.
///
/// Serialises to the durable/wire shape `{"temp": f64, "hum": f64, "time": RFC 3339, ...extra}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "temp")]
    pub temperature: f64,
    #[serde(rename = "hum")]
    pub humidity: f64,
    #[serde(rename = "time", deserialize_with = "deserialize_timestamp")]
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Reading {
    pub fn temperature_fahrenheit(&self) -> f64 {
        celsius_to_fahrenheit(self.temperature)
    }
}

/// A reading as handed to the series store, before it has a timestamp.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewReading {
    #[garde(custom(finite))]
    pub temperature: f64,
    #[garde(custom(finite))]
    pub humidity: f64,
    /// Server time is used when absent.
    #[garde(skip)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NewReading {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            occurred_at: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn with_extra(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Stamps the reading. `now` is only used when no timestamp was supplied.
    pub fn into_reading(self, now: DateTime<Utc>) -> Reading {
        Reading {
            temperature: self.temperature,
            humidity: self.humidity,
            occurred_at: self.occurred_at.unwrap_or(now),
            extra: self.extra,
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Accepts RFC 3339 timestamps and offset-less ISO-8601 ones (read as UTC), which older data
/// files contain.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

pub(crate) fn finite(value: &f64, _ctx: &()) -> garde::Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite number"))
    }
}
