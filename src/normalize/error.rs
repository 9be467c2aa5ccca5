use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Normalization requested before the historical corpus was fitted")]
    NotFitted,

    #[error("Normalization model is already fitted; refitting is not allowed")]
    AlreadyFitted,

    #[error("Cannot fit a normalization model on an empty corpus")]
    EmptyCorpus,

    #[error("Non-finite {feature} value {value} for station '{station}' on {date}")]
    NonFiniteValue {
        station: String,
        feature: &'static str,
        value: f64,
        date: chrono::NaiveDate,
    },
}
