use crate::stations::error::LocateStationError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("No historical scores available for stations [{}]", .stations.join(", "))]
    InsufficientHistory { stations: Vec<String> },

    #[error("Percentile threshold {0} is outside [0, 100]")]
    InvalidPercentile(f64),

    #[error("Current heat score {0} is not a finite number")]
    NonFiniteScore(f64),

    #[error("Failed weighting historical readings on {date}")]
    HistoricalWeighting {
        date: chrono::NaiveDate,
        #[source]
        source: LocateStationError,
    },
}
