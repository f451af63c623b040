use crate::domain::result::DomainResult;
use chrono::{DateTime, Utc};

/// Everything a renderer needs to draw one temperature/humidity chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub title: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    /// Drawn over the raw series when present; same length as `timestamps`.
    pub smoothed: Option<SmoothedSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSeries {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
}

/// A rendered file ready to be attached to a chat reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Turns query output into an image.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PlotRenderer: Send + Sync {
    /// `stem` names the artifact; the renderer appends the extension of its format.
    fn render(&self, request: &PlotRequest, stem: &str) -> DomainResult<RenderedArtifact>;
}
