use chrono::{DateTime, Utc};
use common::domain::{DomainError, DomainResult, PlotRenderer, PlotRequest, RenderedArtifact};
use std::fmt::Write;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 70.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 80.0;
const Y_TICKS: usize = 5;
const X_TICKS: usize = 6;

const TEMPERATURE_COLOR: &str = "#d62728";
const HUMIDITY_COLOR: &str = "#1f77b4";

/// Draws temperature (left axis) and humidity (right axis) against time as an SVG document.
///
/// With smoothed series present the raw lines are drawn faint and the smoothed ones bold.
#[derive(Debug, Default, Clone)]
pub struct SvgPlotRenderer;

impl SvgPlotRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PlotRenderer for SvgPlotRenderer {
    fn render(&self, request: &PlotRequest, stem: &str) -> DomainResult<RenderedArtifact> {
        check_lengths(request)?;
        let svg = draw(request).map_err(|e| DomainError::RenderError(e.to_string()))?;
        Ok(RenderedArtifact {
            filename: format!("{}.svg", stem),
            content_type: "image/svg+xml".to_string(),
            body: svg.into_bytes(),
        })
    }
}

fn check_lengths(request: &PlotRequest) -> DomainResult<()> {
    let n = request.timestamps.len();
    if n == 0 {
        return Err(DomainError::RenderError("nothing to plot".to_string()));
    }
    let mut lengths = vec![request.temperature.len(), request.humidity.len()];
    if let Some(smoothed) = &request.smoothed {
        lengths.push(smoothed.temperature.len());
        lengths.push(smoothed.humidity.len());
    }
    if lengths.iter().any(|&len| len != n) {
        return Err(DomainError::RenderError(format!(
            "series lengths {:?} do not match {} timestamps",
            lengths, n
        )));
    }
    Ok(())
}

/// Linear map from a data range onto a pixel range, padded when the data range is empty.
#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f64,
    max: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn fit<'a>(values: impl Iterator<Item = &'a f64>, from: f64, to: f64) -> Self {
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
        if !min.is_finite() || !max.is_finite() {
            min = 0.0;
            max = 1.0;
        }
        if (max - min).abs() < f64::EPSILON {
            min -= 1.0;
            max += 1.0;
        }
        Self { min, max, from, to }
    }

    fn apply(&self, value: f64) -> f64 {
        self.from + (value - self.min) / (self.max - self.min) * (self.to - self.from)
    }

    fn ticks(&self, count: usize) -> impl Iterator<Item = f64> + '_ {
        let step = (self.max - self.min) / (count - 1) as f64;
        (0..count).map(move |i| self.min + step * i as f64)
    }
}

fn time_scale(timestamps: &[DateTime<Utc>]) -> Scale {
    let seconds: Vec<f64> = timestamps.iter().map(|t| t.timestamp() as f64).collect();
    Scale::fit(seconds.iter(), MARGIN_LEFT, WIDTH - MARGIN_RIGHT)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn polyline(
    out: &mut String,
    xs: &[f64],
    values: &[f64],
    scale: &Scale,
    color: &str,
    width: f64,
    opacity: f64,
) -> std::fmt::Result {
    let points = xs
        .iter()
        .zip(values)
        .map(|(x, v)| format!("{:.1},{:.1}", x, scale.apply(*v)))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(
        out,
        r#"<polyline fill="none" stroke="{}" stroke-width="{}" stroke-opacity="{}" points="{}"/>"#,
        color, width, opacity, points
    )
}

fn draw(request: &PlotRequest) -> Result<String, std::fmt::Error> {
    let plot_top = MARGIN_TOP;
    let plot_bottom = HEIGHT - MARGIN_BOTTOM;
    let plot_left = MARGIN_LEFT;
    let plot_right = WIDTH - MARGIN_RIGHT;

    let smoothed = request.smoothed.as_ref();
    let temperature_values = request
        .temperature
        .iter()
        .chain(smoothed.map(|s| s.temperature.iter()).into_iter().flatten());
    let humidity_values = request
        .humidity
        .iter()
        .chain(smoothed.map(|s| s.humidity.iter()).into_iter().flatten());
    let temperature_scale = Scale::fit(temperature_values, plot_bottom, plot_top);
    let humidity_scale = Scale::fit(humidity_values, plot_bottom, plot_top);
    let x_scale = time_scale(&request.timestamps);
    let xs: Vec<f64> = request
        .timestamps
        .iter()
        .map(|t| x_scale.apply(t.timestamp() as f64))
        .collect();

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = HEIGHT
    )?;
    writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0,
        escape(&request.title)
    )?;

    // grid and y axes
    for (t_tick, h_tick) in temperature_scale
        .ticks(Y_TICKS)
        .zip(humidity_scale.ticks(Y_TICKS))
    {
        let y = temperature_scale.apply(t_tick);
        writeln!(
            out,
            r##"<line x1="{}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="#dddddd" stroke-dasharray="4 4"/>"##,
            plot_left,
            plot_right
        )?;
        writeln!(
            out,
            r#"<text x="{}" y="{:.1}" text-anchor="end" fill="{}">{:.1}</text>"#,
            plot_left - 6.0,
            y + 4.0,
            TEMPERATURE_COLOR,
            t_tick
        )?;
        writeln!(
            out,
            r#"<text x="{}" y="{:.1}" text-anchor="start" fill="{}">{:.1}</text>"#,
            plot_right + 6.0,
            humidity_scale.apply(h_tick) + 4.0,
            HUMIDITY_COLOR,
            h_tick
        )?;
    }
    writeln!(
        out,
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#333333"/>"##,
        plot_left,
        plot_top,
        plot_right - plot_left,
        plot_bottom - plot_top
    )?;
    writeln!(
        out,
        r#"<text transform="translate(18,{:.1}) rotate(-90)" text-anchor="middle" fill="{}">Temperature (°C)</text>"#,
        (plot_top + plot_bottom) / 2.0,
        TEMPERATURE_COLOR
    )?;
    writeln!(
        out,
        r#"<text transform="translate({:.1},{:.1}) rotate(90)" text-anchor="middle" fill="{}">Humidity (%)</text>"#,
        WIDTH - 18.0,
        (plot_top + plot_bottom) / 2.0,
        HUMIDITY_COLOR
    )?;

    // time axis
    for tick in x_scale.ticks(X_TICKS) {
        let x = x_scale.apply(tick);
        let label = DateTime::<Utc>::from_timestamp(tick as i64, 0)
            .map(|t| t.format("%m-%d %H:%M").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            r#"<text transform="translate({:.1},{:.1}) rotate(-45)" text-anchor="end">{}</text>"#,
            x,
            plot_bottom + 16.0,
            label
        )?;
    }

    let (raw_width, raw_opacity) = if smoothed.is_some() {
        (1.0, 0.3)
    } else {
        (2.0, 1.0)
    };
    polyline(
        &mut out,
        &xs,
        &request.temperature,
        &temperature_scale,
        TEMPERATURE_COLOR,
        raw_width,
        raw_opacity,
    )?;
    polyline(
        &mut out,
        &xs,
        &request.humidity,
        &humidity_scale,
        HUMIDITY_COLOR,
        raw_width,
        raw_opacity,
    )?;
    if let Some(smoothed) = smoothed {
        polyline(
            &mut out,
            &xs,
            &smoothed.temperature,
            &temperature_scale,
            TEMPERATURE_COLOR,
            2.5,
            1.0,
        )?;
        polyline(
            &mut out,
            &xs,
            &smoothed.humidity,
            &humidity_scale,
            HUMIDITY_COLOR,
            2.5,
            1.0,
        )?;
    }

    let legend_y = HEIGHT - 12.0;
    let entries: &[(&str, &str)] = if smoothed.is_some() {
        &[
            ("Temperature (smoothed)", TEMPERATURE_COLOR),
            ("Humidity (smoothed)", HUMIDITY_COLOR),
        ]
    } else {
        &[("Temperature", TEMPERATURE_COLOR), ("Humidity", HUMIDITY_COLOR)]
    };
    for (i, (label, color)) in entries.iter().enumerate() {
        let x = plot_left + i as f64 * 220.0;
        writeln!(
            out,
            r#"<line x1="{}" y1="{ly}" x2="{}" y2="{ly}" stroke="{}" stroke-width="2.5"/>"#,
            x,
            x + 24.0,
            color,
            ly = legend_y - 4.0
        )?;
        writeln!(out, r#"<text x="{}" y="{}">{}</text>"#, x + 30.0, legend_y, label)?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::domain::SmoothedSeries;

    fn request(points: usize) -> PlotRequest {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        PlotRequest {
            title: "Weather Data - Last 24 Hours".to_string(),
            timestamps: (0..points)
                .map(|i| start + Duration::minutes(10 * i as i64))
                .collect(),
            temperature: (0..points).map(|i| 25.0 + i as f64).collect(),
            humidity: (0..points).map(|i| 50.0 - i as f64).collect(),
            smoothed: None,
        }
    }

    #[test]
    fn test_renders_svg_artifact() {
        let artifact = SvgPlotRenderer::new()
            .render(&request(12), "weather_plot")
            .unwrap();

        assert_eq!(artifact.filename, "weather_plot.svg");
        assert_eq!(artifact.content_type, "image/svg+xml");
        let svg = String::from_utf8(artifact.body).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Weather Data - Last 24 Hours"));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_smoothed_series_add_bold_lines() {
        let mut request = request(12);
        request.smoothed = Some(SmoothedSeries {
            temperature: request.temperature.clone(),
            humidity: request.humidity.clone(),
        });

        let artifact = SvgPlotRenderer::new()
            .render(&request, "weather_plot_rolling")
            .unwrap();

        let svg = String::from_utf8(artifact.body).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 4);
        assert!(svg.contains(r#"stroke-width="2.5""#));
        assert!(svg.contains("Temperature (smoothed)"));
    }

    #[test]
    fn test_single_point_and_title_escaping() {
        let mut request = request(1);
        request.title = "<Habitat & co>".to_string();

        let artifact = SvgPlotRenderer::new().render(&request, "p").unwrap();

        let svg = String::from_utf8(artifact.body).unwrap();
        assert!(svg.contains("&lt;Habitat &amp; co&gt;"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let mut request = request(5);
        request.humidity.pop();

        assert!(matches!(
            SvgPlotRenderer::new().render(&request, "p"),
            Err(DomainError::RenderError(_))
        ));
        assert!(matches!(
            SvgPlotRenderer::new().render(&self::request(0), "p"),
            Err(DomainError::RenderError(_))
        ));
    }
}
