use crate::domain::Series;
use chrono::{DateTime, Duration, Utc};
use common::domain::{DomainError, DomainResult};
use serde::Serialize;

/// Number of most recent readings returned by `/data` when no limit is given.
pub const DEFAULT_DATA_LIMIT: usize = 100;

/// Default look-back for the chat commands, in hours.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Start of a look-back window of `hours` ending at `now`.
///
/// Non-positive windows put the cutoff at or after `now`, which selects nothing older than `now`.
/// `None` when the window reaches past the representable time range.
pub fn window_cutoff(now: DateTime<Utc>, hours: i64) -> Option<DateTime<Utc>> {
    Duration::try_hours(hours).and_then(|span| now.checked_sub_signed(span))
}

/// Readings within the last `hours` before `now`. A window too long to represent keeps everything.
pub fn filter_window(series: &Series, now: DateTime<Utc>, hours: i64) -> Series {
    match window_cutoff(now, hours) {
        Some(cutoff) => filter_since(series, cutoff),
        None => series.clone(),
    }
}

/// Readings with a timestamp at or after `cutoff`, original order preserved.
pub fn filter_since(series: &Series, cutoff: DateTime<Utc>) -> Series {
    series.retain_where(|reading| reading.occurred_at >= cutoff)
}

/// The last `limit` readings; the whole series if it is shorter.
pub fn tail(series: &Series, limit: usize) -> Series {
    series.last_n(limit)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    fn of(values: impl Iterator<Item = f64>) -> Option<Summary> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        (count > 0).then(|| Summary {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub temperature: Summary,
    pub humidity: Summary,
}

/// Min, max and mean of both channels.
pub fn stats(series: &Series) -> DomainResult<SeriesStats> {
    let insufficient = || DomainError::InsufficientData("no readings to summarize".to_string());
    let temperature = Summary::of(series.iter().map(|r| r.temperature)).ok_or_else(insufficient)?;
    let humidity = Summary::of(series.iter().map(|r| r.humidity)).ok_or_else(insufficient)?;

    Ok(SeriesStats {
        count: series.len(),
        temperature,
        humidity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::domain::NewReading;

    fn series_at(start: DateTime<Utc>, points: &[(i64, f64, f64)]) -> Series {
        Series::from_readings(points.iter().map(|(minutes, temp, hum)| {
            NewReading::new(*temp, *hum)
                .at(start + Duration::minutes(*minutes))
                .into_reading(start)
        }))
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_filter_since_is_inclusive_and_keeps_order() {
        let series = series_at(start(), &[(0, 20.0, 50.0), (30, 21.0, 51.0), (60, 22.0, 52.0)]);

        let filtered = filter_since(&series, start() + Duration::minutes(30));

        assert_eq!(filtered.temperatures(), vec![21.0, 22.0]);
    }

    #[test]
    fn test_filter_since_future_cutoff_is_empty() {
        let series = series_at(start(), &[(0, 20.0, 50.0)]);
        let filtered = filter_since(&series, window_cutoff(start(), -1).unwrap());
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_window_cutoff() {
        assert_eq!(
            window_cutoff(start(), 24),
            Some(Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap())
        );
        assert_eq!(window_cutoff(start(), i64::from(u32::MAX)), None);
        assert_eq!(window_cutoff(start(), i64::MAX), None);
    }

    #[test]
    fn test_filter_window_beyond_time_range_keeps_everything() {
        let series = series_at(start(), &[(0, 20.0, 50.0), (30, 21.0, 51.0)]);

        let all = filter_window(&series, start() + Duration::hours(1), 9_999_999_999_999);
        let recent = filter_window(&series, start() + Duration::minutes(45), 0);

        assert_eq!(all.temperatures(), vec![20.0, 21.0]);
        assert!(recent.is_empty());
    }

    #[test]
    fn test_tail() {
        let series = series_at(start(), &[(0, 1.0, 50.0), (1, 2.0, 50.0), (2, 3.0, 50.0)]);

        assert_eq!(tail(&series, 2).temperatures(), vec![2.0, 3.0]);
        assert_eq!(tail(&series, 100).len(), 3);
        assert!(tail(&series, 0).is_empty());
    }

    #[test]
    fn test_stats() {
        let series = series_at(start(), &[(0, 20.0, 40.0), (1, 30.0, 60.0), (2, 25.0, 50.0)]);

        let stats = stats(&series).unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(stats.temperature.min, 20.0);
        assert_eq!(stats.temperature.max, 30.0);
        assert_eq!(stats.temperature.mean, 25.0);
        assert_eq!(stats.humidity.min, 40.0);
        assert_eq!(stats.humidity.max, 60.0);
        assert_eq!(stats.humidity.mean, 50.0);
    }

    #[test]
    fn test_stats_on_empty_series() {
        assert!(matches!(
            stats(&Series::default()),
            Err(DomainError::InsufficientData(_))
        ));
    }
}
