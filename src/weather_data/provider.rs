//! Seams to the outside world. The engine only talks to these traits, so the live feed,
//! geocoder and corpus source can be swapped for fakes in tests.

use crate::types::lat_lon::LatLon;
use crate::types::station_reading::StationReading;
use crate::weather_data::error::WeatherDataError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the live station snapshot.
#[async_trait]
pub trait StationReadingProvider: Send + Sync {
    /// Readings of every reporting station as of `timestamp`.
    async fn fetch(&self, timestamp: DateTime<Utc>) -> Result<Vec<StationReading>, WeatherDataError>;

    /// Island-wide UV index as of `timestamp`. Sources without one report `None`.
    async fn fetch_uv_index(&self, _timestamp: DateTime<Utc>) -> Result<Option<f64>, WeatherDataError> {
        Ok(None)
    }
}

/// Resolves postal codes to coordinates.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// `Ok(None)` when the code is unknown to the geocoder.
    async fn resolve(&self, postal_code: &str) -> Result<Option<LatLon>, WeatherDataError>;
}

/// Loads the historical corpus. Called once, at engine construction.
#[async_trait]
pub trait HistoricalCorpusLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<StationReading>, WeatherDataError>;
}

/// Serves a fixed set of readings, for replaying a recorded snapshot or corpus.
#[derive(Debug, Clone, Default)]
pub struct StaticReadings(pub Vec<StationReading>);

#[async_trait]
impl StationReadingProvider for StaticReadings {
    async fn fetch(&self, _timestamp: DateTime<Utc>) -> Result<Vec<StationReading>, WeatherDataError> {
        Ok(self.0.clone())
    }
}

#[async_trait]
impl HistoricalCorpusLoader for StaticReadings {
    async fn load(&self) -> Result<Vec<StationReading>, WeatherDataError> {
        Ok(self.0.clone())
    }
}
