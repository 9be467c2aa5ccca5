use crate::types::station_reading::StationReading;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::provider::HistoricalCorpusLoader;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

const STATION_ID: &[&str] = &["stationId"];
const LATITUDE: &[&str] = &["lat", "latitude"];
const LONGITUDE: &[&str] = &["lon", "longitude"];
const AIR_TEMP: &[&str] = &["airTemp"];
const HUMIDITY: &[&str] = &["humidity"];
const WIND_SPEED: &[&str] = &["windSpeed"];
const WIND_DIRECTION: &[&str] = &["windDirection", "windDirection_deg"];
const TIMESTAMP: &[&str] = &["date"];

/// Loads the historical corpus from a headered CSV file.
///
/// Expected columns are `stationId`, `lat` (or `latitude`), `lon` (or `longitude`),
/// `airTemp`, `humidity`, `windSpeed` and `date` as `YYYY-MM-DDTHH:MM:SS`, optionally with a
/// UTC offset such as `+08:00` or `Z`. A `windDirection`
/// column is read when present. Rows come back sorted by date, keeping file order within a
/// date.
#[derive(Debug, Clone)]
pub struct CsvCorpusLoader {
    path: PathBuf,
}

impl CsvCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoricalCorpusLoader for CsvCorpusLoader {
    async fn load(&self) -> Result<Vec<StationReading>, WeatherDataError> {
        let path = self.path.clone();
        let readings = task::spawn_blocking(move || read_corpus(&path)).await??;
        info!(
            "Loaded {} historical readings from {:?}",
            readings.len(),
            self.path
        );
        Ok(readings)
    }
}

/// Reads and validates the corpus synchronously. Run it on a blocking thread.
pub fn read_corpus(path: &Path) -> Result<Vec<StationReading>, WeatherDataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| WeatherDataError::CsvReadPolars {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| WeatherDataError::CsvReadPolars {
            path: path.to_path_buf(),
            source: e,
        })?;

    let station_ids = string_column(&df, path, STATION_ID)?;
    let latitudes = float_column(&df, path, LATITUDE)?;
    let longitudes = float_column(&df, path, LONGITUDE)?;
    let air_temps = float_column(&df, path, AIR_TEMP)?;
    let humidities = float_column(&df, path, HUMIDITY)?;
    let wind_speeds = float_column(&df, path, WIND_SPEED)?;
    let timestamps = string_column(&df, path, TIMESTAMP)?;
    let wind_directions = match find_column(&df, WIND_DIRECTION) {
        Some((name, column)) => Some(as_f64(name, column)?),
        None => None,
    };

    let mut readings = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let (date, time) = parse_timestamp(&timestamps.required(row)?, row)?;
        readings.push(StationReading {
            station_id: station_ids.required(row)?,
            latitude: latitudes.required(row)?,
            longitude: longitudes.required(row)?,
            air_temp: air_temps.required(row)?,
            humidity: humidities.required(row)?,
            wind_speed: wind_speeds.required(row)?,
            wind_direction: wind_directions
                .as_ref()
                .and_then(|c| c.values.get(row).copied().flatten()),
            date,
            time,
        });
    }

    if readings.is_empty() {
        warn!("Historical corpus {:?} has no rows", path);
    }
    readings.sort_by_key(|reading| reading.date);
    Ok(readings)
}

/// Splits `YYYY-MM-DDTHH:MM:SS` into its date and time parts. A timestamp carrying a UTC
/// offset keeps its local wall-clock date and time.
pub fn parse_timestamp(value: &str, row: usize) -> Result<(NaiveDate, NaiveTime), WeatherDataError> {
    let invalid = || WeatherDataError::InvalidTimestamp {
        value: value.to_string(),
        row,
    };
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        let local = timestamp.naive_local();
        return Ok((local.date(), local.time()));
    }
    let (date, time) = value.split_once('T').ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|_| invalid())?;
    Ok((date, time))
}

fn find_column<'a>(df: &'a DataFrame, names: &[&'static str]) -> Option<(&'static str, &'a Column)> {
    names
        .iter()
        .find_map(|name| df.column(name).ok().map(|column| (*name, column)))
}

fn require_column<'a>(
    df: &'a DataFrame,
    path: &Path,
    names: &[&'static str],
) -> Result<(&'static str, &'a Column), WeatherDataError> {
    find_column(df, names).ok_or_else(|| WeatherDataError::MissingColumn {
        path: path.to_path_buf(),
        column: names.join("|"),
    })
}

/// Values of one column, tagged with the header name the file actually used.
struct ColumnValues<T> {
    name: &'static str,
    values: Vec<Option<T>>,
}

impl<T: Clone> ColumnValues<T> {
    fn required(&self, row: usize) -> Result<T, WeatherDataError> {
        self.values
            .get(row)
            .cloned()
            .flatten()
            .ok_or_else(|| WeatherDataError::MissingValue {
                column: self.name.to_string(),
                row,
            })
    }
}

fn as_f64(name: &'static str, column: &Column) -> Result<ColumnValues<f64>, WeatherDataError> {
    let type_error = |source| WeatherDataError::ColumnType {
        column: name.to_string(),
        expected: "f64",
        source,
    };
    let cast = column.cast(&DataType::Float64).map_err(type_error)?;
    let values = cast.f64().map_err(type_error)?;
    Ok(ColumnValues {
        name,
        values: values.into_iter().collect(),
    })
}

fn float_column(
    df: &DataFrame,
    path: &Path,
    names: &[&'static str],
) -> Result<ColumnValues<f64>, WeatherDataError> {
    let (name, column) = require_column(df, path, names)?;
    as_f64(name, column)
}

fn string_column(
    df: &DataFrame,
    path: &Path,
    names: &[&'static str],
) -> Result<ColumnValues<String>, WeatherDataError> {
    let (name, column) = require_column(df, path, names)?;
    let type_error = |source| WeatherDataError::ColumnType {
        column: name.to_string(),
        expected: "string",
        source,
    };
    let cast = column.cast(&DataType::String).map_err(type_error)?;
    let values = cast.str().map_err(type_error)?;
    Ok(ColumnValues {
        name,
        values: values
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_loads_and_sorts_by_date() {
        let file = write_csv(
            "stationId,lat,lon,airTemp,humidity,windSpeed,date\n\
             S50,1.3337,103.7768,28.5,80.1,3.2,2024-01-02T12:00:00\n\
             S109,1.3764,103.8492,27,75,2,2024-01-01T12:00:00\n\
             S50,1.3337,103.7768,26.1,90.0,1.5,2024-01-01T13:00:00\n",
        );
        let readings = CsvCorpusLoader::new(file.path()).load().await.unwrap();

        assert_eq!(readings.len(), 3);
        let order: Vec<(&str, NaiveDate)> = readings
            .iter()
            .map(|r| (r.station_id.as_str(), r.date))
            .collect();
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        assert_eq!(order, vec![("S109", day(1)), ("S50", day(1)), ("S50", day(2))]);

        let first = &readings[0];
        assert_eq!(first.air_temp, 27.0);
        assert_eq!(first.latitude, 1.3764);
        assert_eq!(first.time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(first.wind_direction, None);
    }

    #[test]
    fn test_accepts_long_coordinate_names_and_wind_direction() {
        let file = write_csv(
            "stationId,latitude,longitude,airTemp,humidity,windSpeed,windDirection,date\n\
             S24,1.3678,103.9826,29.0,70.0,4.0,315,2024-03-01T09:30:00\n\
             S24,1.3678,103.9826,29.5,71.0,4.5,,2024-03-01T10:30:00\n",
        );
        let readings = read_corpus(file.path()).unwrap();
        assert_eq!(readings[0].longitude, 103.9826);
        assert_eq!(readings[0].wind_direction, Some(315.0));
        assert_eq!(readings[1].wind_direction, None);
    }

    #[test]
    fn test_missing_column_is_named() {
        let file = write_csv(
            "stationId,lat,lon,airTemp,windSpeed,date\n\
             S50,1.3,103.7,28.5,3.2,2024-01-02T12:00:00\n",
        );
        let err = read_corpus(file.path()).unwrap_err();
        assert!(
            matches!(err, WeatherDataError::MissingColumn { ref column, .. } if column == "humidity"),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_null_cell_names_column_and_row() {
        let file = write_csv(
            "stationId,lat,lon,airTemp,humidity,windSpeed,date\n\
             S50,1.3,103.7,28.5,80,3.2,2024-01-02T12:00:00\n\
             S50,1.3,103.7,,80,3.2,2024-01-03T12:00:00\n",
        );
        let err = read_corpus(file.path()).unwrap_err();
        assert!(
            matches!(err, WeatherDataError::MissingValue { ref column, row: 1 } if column == "airTemp"),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_null_cell_uses_header_name_from_file() {
        let file = write_csv(
            "stationId,latitude,longitude,airTemp,humidity,windSpeed,date\n\
             S50,,103.7,28.5,80,3.2,2024-01-02T12:00:00\n",
        );
        let err = read_corpus(file.path()).unwrap_err();
        assert!(
            matches!(err, WeatherDataError::MissingValue { ref column, row: 0 } if column == "latitude"),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_timestamps_with_offset_keep_local_time() {
        let (date, time) = parse_timestamp("2024-07-16T15:00:00+08:00", 0).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());

        let (date, time) = parse_timestamp("2024-07-16T23:30:00Z", 0).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(23, 30, 0).unwrap());

        let file = write_csv(
            "stationId,lat,lon,airTemp,humidity,windSpeed,date\n\
             S109,1.3764,103.8492,31.2,68,2.4,2024-07-16T15:00:00+08:00\n\
             S109,1.3764,103.8492,29.8,74,3.0,2024-07-15T15:00:00\n",
        );
        let readings = read_corpus(file.path()).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].date, NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
    }

    #[test]
    fn test_bad_timestamp() {
        assert!(parse_timestamp("2024-01-02T12:00:00", 0).is_ok());
        assert!(matches!(
            parse_timestamp("2024-01-02 12:00:00", 4),
            Err(WeatherDataError::InvalidTimestamp { row: 4, .. })
        ));
        assert!(parse_timestamp("2024-13-02T12:00:00", 0).is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = CsvCorpusLoader::new("/nonexistent/heatspot/corpus.csv")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherDataError::CsvReadPolars { .. }));
    }
}
