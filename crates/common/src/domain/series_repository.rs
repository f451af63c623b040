use crate::domain::reading::Reading;
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Durable mirror of the series.
///
/// Implementations should:
/// - return an empty vector when nothing has been saved yet
/// - return `PersistenceError` for unreadable or corrupt data
/// - replace the whole stored series on `save`
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn load(&self) -> DomainResult<Vec<Reading>>;

    async fn save(&self, readings: &[Reading]) -> DomainResult<()>;
}
