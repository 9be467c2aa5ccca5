use crate::types::compass_direction::CompassDirection;
use crate::types::lat_lon::LatLon;
use crate::types::station_reading::WeightedStation;
use crate::types::uv_risk::UvRisk;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical composite score: the inverse-distance weighted heat score of a query's
/// nearest stations on a single calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyWeightedScore {
    pub date: NaiveDate,
    pub weighted_heat_score: f64,
}

/// Outcome of ranking a query point's current composite score against its own history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotResult {
    /// `weighted_score > heat_threshold`.
    #[serde(rename = "isHotspot")]
    pub is_hotspot: bool,
    /// The current composite heat score at the query point.
    pub weighted_score: f64,
    /// The historical score at the requested percentile.
    pub heat_threshold: f64,
    /// Share of historical scores at or below `weighted_score`, 0–100.
    pub percentile: f64,
}

/// A weighted station annotated with values the suggestion layer presents to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessedStation {
    #[serde(flatten)]
    pub station: WeightedStation,
    #[serde(rename = "windDirection_dir", skip_serializing_if = "Option::is_none")]
    pub wind_direction_dir: Option<CompassDirection>,
    #[serde(rename = "heatStress")]
    pub heat_stress: f64,
}

/// Everything known about a location after classification: the hotspot verdict, the
/// stations it was interpolated from and the island-wide UV level when the feed has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotAssessment {
    pub location: LatLon,
    #[serde(flatten)]
    pub result: HotspotResult,
    pub stations: Vec<AssessedStation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_risk: Option<UvRisk>,
}
