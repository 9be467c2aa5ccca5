use crate::config::ConfigError;
use crate::normalize::error::NormalizeError;
use crate::scoring::error::ScoringError;
use crate::stations::error::LocateStationError;
use crate::weather_data::error::WeatherDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeatspotError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No geocoder configured; postal codes cannot be resolved")]
    GeocoderUnavailable,

    #[error("Postal code '{0}' not found")]
    PostalCodeNotFound(String),
}
