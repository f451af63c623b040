pub mod domain;
pub mod garde;
pub mod telemetry;

pub use domain::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMessageSink;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockPlotRenderer;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockSeriesRepository;
