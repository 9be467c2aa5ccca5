//! Shared fixtures for unit tests.

use crate::types::station_reading::StationReading;
use chrono::{NaiveDate, NaiveTime};

pub(crate) fn reading(
    station_id: &str,
    latitude: f64,
    longitude: f64,
    air_temp: f64,
    humidity: f64,
    wind_speed: f64,
    date: &str,
) -> StationReading {
    StationReading {
        station_id: station_id.to_string(),
        latitude,
        longitude,
        air_temp,
        humidity,
        wind_speed,
        wind_direction: None,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid fixture date"),
        time: NaiveTime::MIN,
    }
}
