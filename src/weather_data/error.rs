use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest_middleware::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse response body from {url}")]
    ResponseParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected payload from {url}: {message}")]
    UnexpectedPayload { url: String, message: String },

    #[error("Upstream fetch of '{endpoint}' failed after {attempts} attempt(s)")]
    UpstreamFetch {
        endpoint: String,
        attempts: u32,
        #[source]
        source: Box<WeatherDataError>,
    },

    #[error("Snapshot refresh by a concurrent caller failed: {message}")]
    ConcurrentRefresh { message: String },

    #[error("Geocoding of postal code '{postal_code}' failed: {message}")]
    GeocodingFailure {
        postal_code: String,
        message: String,
    },

    // Errors during CSV reading (inside blocking task)
    #[error("Parsing error reading historical corpus '{path}'")]
    CsvReadPolars {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' in historical corpus '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Column '{column}' could not be read as {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Invalid timestamp '{value}' at row {row}, expected YYYY-MM-DDTHH:MM:SS")]
    InvalidTimestamp { value: String, row: usize },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
