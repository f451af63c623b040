use garde::Validate;
use serde::{Deserialize, Serialize};

/// Safe and ideal ranges for the tracked species' enclosure.
///
/// Defaults are tuned for a sulcata tortoise. The envelope is fixed for the lifetime of the
/// process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HabitatEnvelope {
    #[garde(custom(super::reading::finite))]
    pub temp_min: f64,
    #[garde(custom(super::reading::finite))]
    pub temp_ideal_min: f64,
    #[garde(custom(super::reading::finite))]
    pub temp_ideal_max: f64,
    #[garde(custom(super::reading::finite))]
    pub temp_max: f64,
    #[garde(custom(super::reading::finite))]
    pub hum_min: f64,
    #[garde(custom(super::reading::finite))]
    pub hum_max: f64,
    /// Humidity only raises an alert this far below `hum_min`.
    #[garde(custom(super::reading::finite))]
    pub hum_alert_margin_low: f64,
    /// Humidity only raises an alert this far above `hum_max`.
    #[garde(custom(super::reading::finite))]
    pub hum_alert_margin_high: f64,
}

impl Default for HabitatEnvelope {
    fn default() -> Self {
        Self {
            temp_min: 18.0,
            temp_ideal_min: 27.0,
            temp_ideal_max: 35.0,
            temp_max: 40.0,
            hum_min: 40.0,
            hum_max: 60.0,
            hum_alert_margin_low: 10.0,
            hum_alert_margin_high: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    TooCold,
    Cool,
    Ideal,
    Warm,
    TooHot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityBand {
    Dry,
    Ideal,
    Humid,
}

/// Coarse status reported back to the sensor on every ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Ok,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitatStatus {
    pub temp_status: ConditionStatus,
    pub hum_status: ConditionStatus,
}

impl HabitatEnvelope {
    /// Checks that every threshold is finite and that the ranges are ordered.
    pub fn check(&self) -> Result<(), String> {
        crate::garde::validate_struct(self).map_err(|e| e.to_string())?;
        if !(self.temp_min <= self.temp_ideal_min
            && self.temp_ideal_min <= self.temp_ideal_max
            && self.temp_ideal_max <= self.temp_max)
        {
            return Err(format!(
                "temperature thresholds must be ordered: {} <= {} <= {} <= {}",
                self.temp_min, self.temp_ideal_min, self.temp_ideal_max, self.temp_max
            ));
        }
        if self.hum_min > self.hum_max {
            return Err(format!(
                "humidity thresholds must be ordered: {} <= {}",
                self.hum_min, self.hum_max
            ));
        }
        if self.hum_alert_margin_low < 0.0 || self.hum_alert_margin_high < 0.0 {
            return Err("humidity alert margins must not be negative".to_string());
        }
        Ok(())
    }

    /// Boundaries belong to the safer band: 18.0 is `Cool`, 40.0 is `Warm`.
    pub fn classify_temperature(&self, celsius: f64) -> TemperatureBand {
        if celsius < self.temp_min {
            TemperatureBand::TooCold
        } else if celsius < self.temp_ideal_min {
            TemperatureBand::Cool
        } else if celsius <= self.temp_ideal_max {
            TemperatureBand::Ideal
        } else if celsius <= self.temp_max {
            TemperatureBand::Warm
        } else {
            TemperatureBand::TooHot
        }
    }

    pub fn classify_humidity(&self, percent: f64) -> HumidityBand {
        if percent < self.hum_min {
            HumidityBand::Dry
        } else if percent <= self.hum_max {
            HumidityBand::Ideal
        } else {
            HumidityBand::Humid
        }
    }

    pub fn temperature_too_low(&self, celsius: f64) -> bool {
        celsius < self.temp_min
    }

    pub fn temperature_too_high(&self, celsius: f64) -> bool {
        celsius > self.temp_max
    }

    pub fn humidity_too_low(&self, percent: f64) -> bool {
        percent < self.hum_min - self.hum_alert_margin_low
    }

    pub fn humidity_too_high(&self, percent: f64) -> bool {
        percent > self.hum_max + self.hum_alert_margin_high
    }

    /// Status against the ideal band, which is stricter than the alert thresholds.
    pub fn status(&self, celsius: f64, percent: f64) -> HabitatStatus {
        let temp_ok = self.temp_ideal_min <= celsius && celsius <= self.temp_ideal_max;
        let hum_ok = self.hum_min <= percent && percent <= self.hum_max;
        HabitatStatus {
            temp_status: if temp_ok {
                ConditionStatus::Ok
            } else {
                ConditionStatus::Warning
            },
            hum_status: if hum_ok {
                ConditionStatus::Ok
            } else {
                ConditionStatus::Warning
            },
        }
    }
}
