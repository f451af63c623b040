use crate::domain::SeriesStore;
use common::domain::SeriesRepository;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Default number of appends between two checkpoints.
pub const DEFAULT_FLUSH_EVERY: u64 = 10;

/// Best-effort persistence of the series store.
///
/// Neither restore nor checkpoint ever fails the caller: problems are logged and the
/// in-memory store stays authoritative.
pub struct SeriesCheckpointer {
    repository: Arc<dyn SeriesRepository>,
    flush_every: u64,
}

impl SeriesCheckpointer {
    /// `flush_every == 0` turns periodic checkpoints off; explicit ones still run.
    pub fn new(repository: Arc<dyn SeriesRepository>, flush_every: u64) -> Self {
        Self {
            repository,
            flush_every,
        }
    }

    /// Whether the append with this lifetime sequence number should trigger a checkpoint.
    pub fn is_due(&self, sequence: u64) -> bool {
        self.flush_every > 0 && sequence > 0 && sequence % self.flush_every == 0
    }

    /// Fill the store from the last checkpoint. A missing or unreadable file leaves it empty.
    #[instrument(skip_all)]
    pub async fn restore(&self, store: &SeriesStore) -> usize {
        match self.repository.load().await {
            Ok(readings) => {
                let loaded = readings.len();
                let restored = store.restore(readings).await;
                info!(loaded, restored, "loaded persisted readings");
                restored
            }
            Err(e) => {
                warn!(error = %e, "could not load persisted readings, starting empty");
                0
            }
        }
    }

    /// Write a full snapshot of the store. Returns whether the write succeeded.
    #[instrument(skip_all)]
    pub async fn checkpoint(&self, store: &SeriesStore) -> bool {
        let snapshot = store.snapshot().await;
        match self.repository.save(&snapshot.to_readings()).await {
            Ok(()) => {
                debug!(readings = snapshot.len(), "checkpoint written");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to write checkpoint");
                false
            }
        }
    }
}
