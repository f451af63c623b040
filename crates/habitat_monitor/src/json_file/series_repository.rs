use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, Reading, SeriesRepository};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

/// Persists the series as one JSON array of flat reading records.
///
/// Each record carries `temp`, `hum`, an ISO-8601 `time` and any extra fields. A save writes a
/// sibling temp file and renames it over the target, so readers only ever see a complete file.
pub struct JsonFileSeriesRepository {
    path: PathBuf,
    saves: AtomicU64,
}

impl JsonFileSeriesRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            saves: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            self.saves.fetch_add(1, Ordering::Relaxed)
        ));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SeriesRepository for JsonFileSeriesRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> DomainResult<Vec<Reading>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no data file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(DomainError::PersistenceError(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::PersistenceError(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    #[instrument(skip(self, readings), fields(path = %self.path.display(), readings = readings.len()))]
    async fn save(&self, readings: &[Reading]) -> DomainResult<()> {
        let json = serde_json::to_vec(readings)
            .map_err(|e| DomainError::PersistenceError(format!("failed to encode series: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::PersistenceError(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let staging = self.staging_path();
        if let Err(e) = tokio::fs::write(&staging, json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(DomainError::PersistenceError(format!(
                "failed to write {}: {}",
                staging.display(),
                e
            )));
        }
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(DomainError::PersistenceError(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!("series saved");
        Ok(())
    }
}
