//! Time-bounded cache of the live station snapshot.
//!
//! Readers share a read lock while the snapshot is fresh. Once it expires, refreshes are
//! single-flight: callers queue on one async mutex, and whoever acquires it after a refresh
//! completed takes that refresh's outcome, success or failure. A burst of queries past the
//! TTL reaches the upstream provider once.

use crate::types::station_reading::StationReading;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::provider::StationReadingProvider;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

/// One fetch of the live feed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub readings: Vec<StationReading>,
    pub uv_index: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    fetched: Instant,
}

impl Snapshot {
    fn new(readings: Vec<StationReading>, uv_index: Option<f64>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            readings,
            uv_index,
            fetched_at,
            fetched: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched.elapsed()
    }
}

/// Result of the most recent refresh. Failures keep only the message.
type RefreshOutcome = Result<Arc<Snapshot>, String>;

pub struct SnapshotCache {
    provider: Arc<dyn StationReadingProvider>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    refresh: Mutex<Option<RefreshOutcome>>,
    /// Completed refreshes. Only changes while `refresh` is held.
    refreshes: AtomicU64,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SnapshotCache {
    pub fn new(provider: Arc<dyn StationReadingProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .filter(|snapshot| snapshot.age() < self.ttl)
            .cloned()
    }

    /// The last fetched snapshot, fresh or not, without touching the provider.
    pub async fn peek(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Returns the cached snapshot if it is younger than the TTL, otherwise fetches a new one.
    ///
    /// # Errors
    ///
    /// The caller that performed the refresh gets the provider's error unchanged. Callers that
    /// were queued behind it get [`WeatherDataError::ConcurrentRefresh`] with the same message.
    /// The previous snapshot stays cached, and the next call tries again.
    pub async fn get(&self) -> Result<Arc<Snapshot>, WeatherDataError> {
        let seen = self.refreshes.load(Ordering::Acquire);
        if let Some(snapshot) = self.fresh().await {
            debug!("Snapshot cache hit (age {:?})", snapshot.age());
            return Ok(snapshot);
        }

        let mut last = self.refresh.lock().await;
        // Another caller completed a refresh while this one waited.
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.as_ref() {
                debug!("Taking the outcome of a concurrent snapshot refresh");
                return outcome
                    .clone()
                    .map_err(|message| WeatherDataError::ConcurrentRefresh { message });
            }
        }
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        info!("Snapshot cache miss, fetching live readings");
        let fetched_at = Utc::now();
        let (fetched, uv_index) = tokio::join!(
            self.provider.fetch(fetched_at),
            self.provider.fetch_uv_index(fetched_at)
        );
        let result = match fetched {
            Ok(readings) => {
                // UV is an annotation. Its absence does not fail the refresh.
                let uv_index = uv_index.unwrap_or_else(|err| {
                    warn!("UV index unavailable, continuing without it: {}", err);
                    None
                });
                let snapshot = Arc::new(Snapshot::new(readings, uv_index, fetched_at));
                *self.snapshot.write().await = Some(snapshot.clone());
                info!(
                    "Cached snapshot of {} readings fetched at {}",
                    snapshot.readings.len(),
                    fetched_at
                );
                *last = Some(Ok(snapshot.clone()));
                Ok(snapshot)
            }
            Err(err) => {
                warn!("Snapshot refresh failed, keeping previous snapshot: {}", err);
                *last = Some(Err(error_chain(&err)));
                Err(err)
            }
        };
        self.refreshes.fetch_add(1, Ordering::Release);
        result
    }

    /// Marks the cached snapshot stale so the next [`SnapshotCache::get`] refetches.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }
}

fn error_chain(err: &WeatherDataError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
