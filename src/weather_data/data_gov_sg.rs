//! Live station snapshot from the data.gov.sg real-time weather API.
//!
//! Four endpoints report one quantity each. Station metadata only comes with the
//! air-temperature response, and the quantities are joined per station. The UV index is a
//! single island-wide value, published during daylight hours only.

use crate::types::station_reading::StationReading;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::provider::StationReadingProvider;
use crate::weather_data::retry::{build_client, get_json, RetryPolicy};
use async_trait::async_trait;
use bon::bon;
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use futures_util::future::try_join4;
use log::{debug, info, warn};
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_DATA_GOV_BASE_URL: &str = "https://api-open.data.gov.sg/v2/real-time/api";

const AIR_TEMPERATURE: &str = "air-temperature";
const WIND_SPEED: &str = "wind-speed";
const WIND_DIRECTION: &str = "wind-direction";
const RELATIVE_HUMIDITY: &str = "relative-humidity";
const UV_INDEX: &str = "uv";

/// Local hours during which the UV endpoint reports. Outside them the index is 0.
const UV_REPORTING_HOURS: RangeInclusive<u32> = 7..=21;

/// Singapore local time, which the API expects in its `date` parameter.
const SGT_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Deserialize)]
pub(crate) struct RealtimeResponse {
    data: Option<RealtimeData>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RealtimeData {
    #[serde(default)]
    stations: Vec<RealtimeStation>,
    #[serde(default)]
    readings: Vec<RealtimeReadingSet>,
}

#[derive(Debug, Deserialize)]
struct RealtimeStation {
    id: String,
    location: RealtimeLocation,
}

#[derive(Debug, Deserialize)]
struct RealtimeLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RealtimeReadingSet {
    timestamp: DateTime<FixedOffset>,
    data: Vec<RealtimeValue>,
}

#[derive(Debug, Deserialize)]
struct RealtimeValue {
    #[serde(rename = "stationId")]
    station_id: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UvResponse {
    data: Option<UvData>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UvData {
    #[serde(default)]
    records: Vec<UvRecord>,
}

#[derive(Debug, Deserialize)]
struct UvRecord {
    /// Hourly values, latest first.
    #[serde(default)]
    index: Vec<UvValue>,
}

#[derive(Debug, Deserialize)]
struct UvValue {
    value: f64,
}

/// The most recent hourly UV index, if the day has one yet.
pub(crate) fn latest_uv_index(response: UvResponse, url: &str) -> Result<Option<f64>, WeatherDataError> {
    let data = response.data.ok_or_else(|| WeatherDataError::UnexpectedPayload {
        url: url.to_string(),
        message: response
            .error_msg
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| "response has no data".to_string()),
    })?;
    Ok(data
        .records
        .first()
        .and_then(|record| record.index.first())
        .map(|uv| uv.value))
}

impl RealtimeResponse {
    fn into_data(self, url: &str) -> Result<RealtimeData, WeatherDataError> {
        self.data.ok_or_else(|| WeatherDataError::UnexpectedPayload {
            url: url.to_string(),
            message: self
                .error_msg
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| "response has no data".to_string()),
        })
    }
}

impl RealtimeData {
    fn latest(&self) -> Option<&RealtimeReadingSet> {
        self.readings.first()
    }

    fn values(&self) -> HashMap<&str, f64> {
        self.latest()
            .map(|set| {
                set.data
                    .iter()
                    .map(|v| (v.station_id.as_str(), v.value))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn singapore_time(timestamp: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(SGT_OFFSET_SECS) {
        Some(offset) => timestamp.with_timezone(&offset),
        None => timestamp.fixed_offset(),
    }
}

/// Formats a timestamp the way the API's `date` parameter expects: local time without offset.
pub fn format_query_timestamp(timestamp: DateTime<Utc>) -> String {
    singapore_time(timestamp)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Whether the UV endpoint publishes at `timestamp`, judged by Singapore local hour.
pub fn within_uv_reporting_hours(timestamp: DateTime<Utc>) -> bool {
    UV_REPORTING_HOURS.contains(&singapore_time(timestamp).hour())
}

/// Inner-joins the four responses on station id. Wind direction may be missing for a station.
pub(crate) fn join_readings(
    air_temperature: RealtimeResponse,
    wind_speed: RealtimeResponse,
    wind_direction: RealtimeResponse,
    relative_humidity: RealtimeResponse,
    base_url: &str,
) -> Result<Vec<StationReading>, WeatherDataError> {
    let air_url = format!("{}/{}", base_url, AIR_TEMPERATURE);
    let air = air_temperature.into_data(&air_url)?;
    let wind = wind_speed.into_data(&format!("{}/{}", base_url, WIND_SPEED))?;
    let direction = wind_direction.into_data(&format!("{}/{}", base_url, WIND_DIRECTION))?;
    let humidity = relative_humidity.into_data(&format!("{}/{}", base_url, RELATIVE_HUMIDITY))?;

    let latest = air.latest().ok_or_else(|| WeatherDataError::UnexpectedPayload {
        url: air_url.clone(),
        message: "no readings reported".to_string(),
    })?;
    let local = latest.timestamp.naive_local();

    let air_values = air.values();
    let wind_values = wind.values();
    let direction_values = direction.values();
    let humidity_values = humidity.values();

    let mut readings = Vec::with_capacity(air.stations.len());
    for station in &air.stations {
        let id = station.id.as_str();
        let (Some(air_temp), Some(wind_speed), Some(humidity)) = (
            air_values.get(id),
            wind_values.get(id),
            humidity_values.get(id),
        ) else {
            debug!("Station {} is missing from at least one feed, skipping", id);
            continue;
        };
        readings.push(StationReading {
            station_id: station.id.clone(),
            latitude: station.location.latitude,
            longitude: station.location.longitude,
            air_temp: *air_temp,
            humidity: *humidity,
            wind_speed: *wind_speed,
            wind_direction: direction_values.get(id).copied(),
            date: local.date(),
            time: local.time(),
        });
    }

    if readings.is_empty() {
        warn!("No station reported all of air temperature, wind speed and humidity");
    }
    Ok(readings)
}

/// [`StationReadingProvider`] backed by the data.gov.sg real-time API.
#[derive(Debug, Clone)]
pub struct DataGovSgProvider {
    client: ClientWithMiddleware,
    base_url: String,
    retry: RetryPolicy,
}

#[bon]
impl DataGovSgProvider {
    /// Builds a provider. Defaults: the public API base URL, [`RetryPolicy::default`] and a
    /// 10 second request timeout.
    #[builder]
    pub fn new(
        base_url: Option<String>,
        retry: Option<RetryPolicy>,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherDataError> {
        let retry = retry.unwrap_or_default();
        let client = build_client(
            Client::builder().timeout(timeout.unwrap_or(Duration::from_secs(10))),
            &retry,
        )?;
        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_DATA_GOV_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_endpoint<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        date: &str,
    ) -> Result<T, WeatherDataError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let query = [("date", date)];
        get_json(&self.client, &self.retry, endpoint, &url, &query, None).await
    }
}

#[async_trait]
impl StationReadingProvider for DataGovSgProvider {
    async fn fetch(&self, timestamp: DateTime<Utc>) -> Result<Vec<StationReading>, WeatherDataError> {
        let date = format_query_timestamp(timestamp);
        info!("Fetching real-time station readings for {}", date);

        let (air_temperature, wind_speed, wind_direction, relative_humidity): (
            RealtimeResponse,
            RealtimeResponse,
            RealtimeResponse,
            RealtimeResponse,
        ) = try_join4(
            self.fetch_endpoint(AIR_TEMPERATURE, &date),
            self.fetch_endpoint(WIND_SPEED, &date),
            self.fetch_endpoint(WIND_DIRECTION, &date),
            self.fetch_endpoint(RELATIVE_HUMIDITY, &date),
        )
        .await?;

        let readings = join_readings(
            air_temperature,
            wind_speed,
            wind_direction,
            relative_humidity,
            &self.base_url,
        )?;
        info!("Received readings from {} stations", readings.len());
        Ok(readings)
    }

    async fn fetch_uv_index(&self, timestamp: DateTime<Utc>) -> Result<Option<f64>, WeatherDataError> {
        if !within_uv_reporting_hours(timestamp) {
            debug!("Outside UV reporting hours, UV index is 0");
            return Ok(Some(0.0));
        }
        let date = format_query_timestamp(timestamp);
        let response: UvResponse = self.fetch_endpoint(UV_INDEX, &date).await?;
        let uv_index = latest_uv_index(response, &format!("{}/{}", self.base_url, UV_INDEX))?;
        debug!("UV index at {}: {:?}", date, uv_index);
        Ok(uv_index)
    }
}
