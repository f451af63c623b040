//! Smoothing filters applied to the temperature and humidity channels before plotting.
//!
//! Both filters return a sequence of the same length as their input and never leave gaps.

use crate::domain::Series;
use common::domain::{DomainError, DomainResult, SmoothedSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoothing {
    /// Centered moving average over `window` samples.
    MovingAverage { window: usize },
    /// Savitzky-Golay filter: local least-squares polynomial fit.
    Polynomial { window: usize, poly_order: usize },
}

impl Smoothing {
    /// Apply the filter to both channels of `series`.
    pub fn apply(&self, series: &Series) -> DomainResult<SmoothedSeries> {
        let (temperature, humidity) = match *self {
            Smoothing::MovingAverage { window } => (
                moving_average(&series.temperatures(), window)?,
                moving_average(&series.humidities(), window)?,
            ),
            Smoothing::Polynomial { window, poly_order } => (
                polynomial(&series.temperatures(), window, poly_order)?,
                polynomial(&series.humidities(), window, poly_order)?,
            ),
        };
        Ok(SmoothedSeries {
            temperature,
            humidity,
        })
    }
}

/// Centered moving average.
///
/// Only positions whose window lies fully inside the input get a mean. For even windows the
/// extra sample sits before the position. Positions without a full window take the nearest
/// computed value: forward fill first, then backward fill.
pub fn moving_average(values: &[f64], window: usize) -> DomainResult<Vec<f64>> {
    if window == 0 {
        return Err(DomainError::InvalidParameter(
            "window must be at least 1".to_string(),
        ));
    }
    let n = values.len();
    if n < window {
        return Err(DomainError::InsufficientData(format!(
            "need at least {} readings for a window of {}, have {}",
            window, window, n
        )));
    }

    let offset = (window - 1) / 2;
    let mut prefix = Vec::with_capacity(n + 1);
    let mut running = 0.0;
    prefix.push(running);
    for value in values {
        running += value;
        prefix.push(running);
    }

    let means: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let end = i + offset + 1;
            if end > n || end < window {
                return None;
            }
            let start = end - window;
            Some((prefix[end] - prefix[start]) / window as f64)
        })
        .collect();

    Ok(fill_gaps(means))
}

fn fill_gaps(values: Vec<Option<f64>>) -> Vec<f64> {
    let mut filled = Vec::with_capacity(values.len());
    let mut last = None;
    for value in values {
        last = value.or(last);
        filled.push(last);
    }

    let first_known = filled.iter().flatten().next().copied().unwrap_or(f64::NAN);
    filled
        .into_iter()
        .map(|v| v.unwrap_or(first_known))
        .collect()
}

/// Even windows are widened by one; the polynomial filter needs a center sample.
pub fn odd_window(window: usize) -> usize {
    if window % 2 == 0 {
        window + 1
    } else {
        window
    }
}

/// Savitzky-Golay smoothing.
///
/// Interior samples take the value of a degree `poly_order` least-squares fit over the
/// surrounding `window` samples. The first and last `window / 2` samples are evaluated on a
/// single fit over the first and last full window respectively.
pub fn polynomial(values: &[f64], window: usize, poly_order: usize) -> DomainResult<Vec<f64>> {
    let window = odd_window(window);
    let n = values.len();
    if n <= window {
        return Err(DomainError::InsufficientData(format!(
            "need more than {} readings for a window of {}, have {}",
            window, window, n
        )));
    }
    if poly_order >= window {
        return Err(DomainError::InvalidParameter(format!(
            "polynomial order {} must be less than window {}",
            poly_order, window
        )));
    }

    let fit = LocalFit::new(window, poly_order);
    let half = window / 2;
    let weights = fit.weights_at_center()?;

    let mut smoothed = vec![0.0; n];
    for (i, slot) in smoothed.iter_mut().enumerate().take(n - half).skip(half) {
        let samples = &values[i - half..=i + half];
        *slot = weights.iter().zip(samples).map(|(w, y)| w * y).sum();
    }

    let head = fit.coefficients(&values[..window])?;
    for (i, slot) in smoothed.iter_mut().enumerate().take(half) {
        *slot = evaluate(&head, fit.xs[i]);
    }
    let tail = fit.coefficients(&values[n - window..])?;
    for j in 0..half {
        smoothed[n - half + j] = evaluate(&tail, fit.xs[half + 1 + j]);
    }

    Ok(smoothed)
}

/// Least-squares polynomial fit over a fixed window, abscissae scaled into [-1, 1].
struct LocalFit {
    xs: Vec<f64>,
    terms: usize,
    normal: Vec<Vec<f64>>,
}

impl LocalFit {
    fn new(window: usize, poly_order: usize) -> Self {
        let half = window / 2;
        let scale = if half == 0 { 1.0 } else { half as f64 };
        let xs: Vec<f64> = (0..window)
            .map(|k| (k as f64 - half as f64) / scale)
            .collect();
        let terms = poly_order + 1;

        let mut normal = vec![vec![0.0; terms]; terms];
        for (a, row) in normal.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell = xs.iter().map(|x| x.powi((a + b) as i32)).sum();
            }
        }

        Self { xs, terms, normal }
    }

    /// Convolution weights giving the fitted value at the window center.
    fn weights_at_center(&self) -> DomainResult<Vec<f64>> {
        let mut unit = vec![0.0; self.terms];
        unit[0] = 1.0;
        let z = solve(self.normal.clone(), unit)?;
        Ok(self.xs.iter().map(|x| evaluate(&z, *x)).collect())
    }

    fn coefficients(&self, samples: &[f64]) -> DomainResult<Vec<f64>> {
        let rhs: Vec<f64> = (0..self.terms)
            .map(|a| {
                self.xs
                    .iter()
                    .zip(samples)
                    .map(|(x, y)| x.powi(a as i32) * y)
                    .sum()
            })
            .collect();
        solve(self.normal.clone(), rhs)
    }
}

fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> DomainResult<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(DomainError::InvalidParameter(
                "polynomial fit is singular for this window".to_string(),
            ));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let pivot_row = matrix[col].clone();
        let pivot_rhs = rhs[col];
        for row in col + 1..n {
            let factor = matrix[row][col] / pivot_row[col];
            for k in col..n {
                matrix[row][k] -= factor * pivot_row[k];
            }
            rhs[row] -= factor * pivot_rhs;
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-9, "index {}: {} != {}", i, a, e);
        }
    }

    #[test]
    fn test_moving_average_odd_window_fills_edges() {
        let smoothed = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_close(&smoothed, &[2.0, 2.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_moving_average_even_window_leans_back() {
        let smoothed = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 4).unwrap();
        assert_close(&smoothed, &[2.5, 2.5, 2.5, 3.5, 4.5, 4.5]);
    }

    #[test]
    fn test_moving_average_window_one_is_identity() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_close(&moving_average(&values, 1).unwrap(), &values);
    }

    #[test]
    fn test_moving_average_window_equal_to_length() {
        let smoothed = moving_average(&[2.0, 4.0, 6.0], 3).unwrap();
        assert_close(&smoothed, &[4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_moving_average_rejects_short_series_and_zero_window() {
        assert!(matches!(
            moving_average(&[1.0, 2.0], 3),
            Err(DomainError::InsufficientData(_))
        ));
        assert!(matches!(
            moving_average(&[1.0, 2.0], 0),
            Err(DomainError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_polynomial_reproduces_polynomials_of_its_order() {
        let values: Vec<f64> = (0..15)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x - 3.0 * x + 2.0
            })
            .collect();

        let smoothed = polynomial(&values, 7, 2).unwrap();

        assert_close(&smoothed, &values);
    }

    #[test]
    fn test_polynomial_order_zero_is_windowed_mean() {
        let values = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];

        let smoothed = polynomial(&values, 3, 0).unwrap();

        let third = 1.0 / 3.0;
        assert_close(&smoothed, &[third, third, -third, third, -third, -third]);
    }

    #[test]
    fn test_polynomial_even_window_is_widened() {
        // window 4 becomes 5, so 5 readings are not enough and 6 are
        assert!(matches!(
            polynomial(&[1.0; 5], 4, 2),
            Err(DomainError::InsufficientData(_))
        ));
        assert_close(&polynomial(&[1.0; 6], 4, 2).unwrap(), &[1.0; 6]);
    }

    #[test]
    fn test_polynomial_requires_more_readings_than_window() {
        assert!(matches!(
            polynomial(&[1.0; 7], 7, 3),
            Err(DomainError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_polynomial_rejects_order_not_below_window() {
        assert!(matches!(
            polynomial(&[1.0; 20], 5, 5),
            Err(DomainError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_polynomial_reduces_noise() {
        let values: Vec<f64> = (0..40)
            .map(|i| 25.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();

        let smoothed = polynomial(&values, 7, 3).unwrap();

        let spread = |v: &[f64]| {
            v.iter().cloned().fold(f64::MIN, f64::max) - v.iter().cloned().fold(f64::MAX, f64::min)
        };
        assert_eq!(smoothed.len(), values.len());
        assert!(spread(&smoothed[3..37]) < spread(&values[3..37]));
    }

    #[test]
    fn test_apply_smooths_both_channels() {
        use chrono::{TimeZone, Utc};
        use common::domain::NewReading;

        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let series = Series::from_readings(
            (0..5).map(|i| NewReading::new(i as f64, 10.0 * i as f64).into_reading(start)),
        );

        let smoothed = Smoothing::MovingAverage { window: 3 }
            .apply(&series)
            .unwrap();

        assert_close(&smoothed.temperature, &[1.0, 1.0, 2.0, 3.0, 3.0]);
        assert_close(&smoothed.humidity, &[10.0, 10.0, 20.0, 30.0, 30.0]);
    }
}
