use crate::domain::Series;
use chrono::Utc;
use common::domain::{DomainResult, NewReading, Reading, MAX_DATA_POINTS};
use common::garde::validate_struct;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct Appended {
    pub reading: Arc<Reading>,
    /// Lifetime count of appended readings, including this one. Not reset by eviction.
    pub sequence: u64,
    /// Readings dropped from the front to stay within capacity.
    pub evicted: usize,
    pub len: usize,
}

struct StoreState {
    readings: VecDeque<Arc<Reading>>,
    appended: u64,
}

/// Bounded, insertion-ordered, in-memory series of readings.
///
/// The store is the only writer. Once `capacity` is reached the oldest readings are evicted
/// first. Readers get [`Series`] snapshots that never observe later appends.
pub struct SeriesStore {
    state: RwLock<StoreState>,
    capacity: usize,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DATA_POINTS)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: RwLock::new(StoreState {
                readings: VecDeque::with_capacity(capacity.min(MAX_DATA_POINTS)),
                appended: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validate, stamp and append a reading, evicting from the front past capacity.
    ///
    /// Validation happens before the lock is taken; a rejected reading leaves the store untouched.
    pub async fn append(&self, new_reading: NewReading) -> DomainResult<Appended> {
        validate_struct(&new_reading)?;
        let reading = Arc::new(new_reading.into_reading(Utc::now()));

        let mut state = self.state.write().await;
        state.readings.push_back(Arc::clone(&reading));
        let mut evicted = 0;
        while state.readings.len() > self.capacity {
            state.readings.pop_front();
            evicted += 1;
        }
        state.appended += 1;

        Ok(Appended {
            reading,
            sequence: state.appended,
            evicted,
            len: state.readings.len(),
        })
    }

    pub async fn snapshot(&self) -> Series {
        let state = self.state.read().await;
        Series::new(state.readings.iter().cloned().collect())
    }

    pub async fn latest(&self) -> Option<Arc<Reading>> {
        self.state.read().await.readings.back().cloned()
    }

    pub async fn size(&self) -> usize {
        self.state.read().await.readings.len()
    }

    /// Replace the contents with previously persisted readings, keeping only the newest
    /// `capacity` of them. The append counter is left alone.
    pub async fn restore(&self, readings: Vec<Reading>) -> usize {
        let skip = readings.len().saturating_sub(self.capacity);
        let mut state = self.state.write().await;
        state.readings = readings.into_iter().skip(skip).map(Arc::new).collect();
        debug!(
            restored = state.readings.len(),
            dropped = skip,
            "restored series"
        );
        state.readings.len()
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}
