use chrono::{DateTime, Utc};
use common::domain::Reading;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Point-in-time, read-only view of the stored readings in insertion order.
///
/// Readings are shared with the store, so taking a snapshot copies pointers, not samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    readings: Vec<Arc<Reading>>,
}

impl Series {
    pub fn new(readings: Vec<Arc<Reading>>) -> Self {
        Self { readings }
    }

    pub fn from_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self {
            readings: readings.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> + '_ {
        self.readings.iter().map(|r| r.as_ref())
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last().map(|r| r.as_ref())
    }

    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.readings.get(index).map(|r| r.as_ref())
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.iter().map(|r| r.occurred_at).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.iter().map(|r| r.temperature).collect()
    }

    pub fn humidities(&self) -> Vec<f64> {
        self.iter().map(|r| r.humidity).collect()
    }

    /// Owned copies, e.g. for writing to disk.
    pub fn to_readings(&self) -> Vec<Reading> {
        self.iter().cloned().collect()
    }

    pub(crate) fn retain_where(&self, keep: impl Fn(&Reading) -> bool) -> Series {
        Series {
            readings: self
                .readings
                .iter()
                .filter(|r| keep(r.as_ref()))
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn last_n(&self, n: usize) -> Series {
        let start = self.readings.len().saturating_sub(n);
        Series {
            readings: self.readings[start..].to_vec(),
        }
    }
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
