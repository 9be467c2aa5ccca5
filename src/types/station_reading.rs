//! Defines the fixed-shape records that flow through the engine: raw station readings,
//! readings augmented with normalized features, and readings weighted against a query point.
//!
//! Field names serialize the way the dashboard layer expects them (`stationId`, `airTemp`,
//! `airTemp_norm`, `heat_score_norm`, ...).

use crate::types::lat_lon::LatLon;
use bon::Builder;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single observation reported by a weather station.
///
/// Readings are immutable once ingested. A reading is identified by its `station_id` and
/// `date`, plus `time` for live snapshots where a station reports more than once a day.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use heatspot::StationReading;
///
/// let reading = StationReading::builder()
///     .station_id("S109".to_string())
///     .latitude(1.3764)
///     .longitude(103.8492)
///     .air_temp(31.2)
///     .humidity(68.0)
///     .wind_speed(2.4)
///     .date(NaiveDate::from_ymd_opt(2024, 7, 16).unwrap())
///     .time(NaiveTime::from_hms_opt(15, 0, 0).unwrap())
///     .build();
/// assert_eq!(reading.station_id, "S109");
/// assert_eq!(reading.wind_direction, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    /// Upstream station identifier (e.g. "S109").
    pub station_id: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Air temperature in °C.
    pub air_temp: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Wind speed in knots, as reported by the feed.
    pub wind_speed: f64,
    /// Wind direction in degrees, when the feed reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl StationReading {
    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }
}

/// A [`StationReading`] augmented with features scaled by the frozen
/// [`crate::NormalizationModel`].
///
/// `heat_score = air_temp_norm + humidity_norm - wind_speed_norm`, and `heat_score_norm` is
/// that score passed through the model's dedicated heat-score scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    #[serde(flatten)]
    pub reading: StationReading,
    #[serde(rename = "airTemp_norm")]
    pub air_temp_norm: f64,
    #[serde(rename = "humidity_norm")]
    pub humidity_norm: f64,
    #[serde(rename = "windSpeed_norm")]
    pub wind_speed_norm: f64,
    pub heat_score: f64,
    pub heat_score_norm: f64,
}

impl NormalizedReading {
    pub fn station_id(&self) -> &str {
        &self.reading.station_id
    }

    pub fn location(&self) -> LatLon {
        self.reading.location()
    }
}

/// A [`NormalizedReading`] selected for a query point, with its geodesic distance to that
/// point and its inverse-distance weight within the selected set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedStation {
    #[serde(flatten)]
    pub station: NormalizedReading,
    /// Geodesic distance to the query point, in kilometers.
    pub distance: f64,
    /// `(1 / distance) / Σ(1 / distance)` over the selected set.
    pub weight: f64,
}

impl WeightedStation {
    pub fn station_id(&self) -> &str {
        self.station.station_id()
    }
}
