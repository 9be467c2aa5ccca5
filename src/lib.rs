pub mod config;
mod error;
mod heatspot;
pub mod normalize;
pub mod scoring;
pub mod stations;
mod types;
pub mod weather_data;

#[cfg(test)]
mod test_support;

pub use error::HeatspotError;
pub use heatspot::*;

pub use config::{ConfigError, ConfigSource, HeatspotConfig, UpstreamConfig};

pub use types::compass_direction::CompassDirection;
pub use types::hotspot::{AssessedStation, DailyWeightedScore, HotspotAssessment, HotspotResult};
pub use types::lat_lon::LatLon;
pub use types::station_reading::{NormalizedReading, StationReading, WeightedStation};
pub use types::uv_risk::UvRisk;

pub use normalize::error::NormalizeError;
pub use normalize::feature_normalizer::{FeatureNormalizer, MinMaxScale, NormalizationModel};

pub use stations::error::LocateStationError;
pub use stations::locate_station::{
    geodesic_distance_km, inverse_distance_weights, nearest_stations, StationLocator,
};

pub use scoring::baseline::{build_distribution, build_seasonal_distribution, SeasonalWindow};
pub use scoring::classifier::{
    classify, percentile, percentile_rank, DEFAULT_PERCENTILE_THRESHOLD,
};
pub use scoring::error::ScoringError;
pub use scoring::heat_score::{composite_score, estimate_heat_stress, heat_score};

pub use weather_data::corpus_loader::CsvCorpusLoader;
pub use weather_data::data_gov_sg::DataGovSgProvider;
pub use weather_data::error::WeatherDataError;
pub use weather_data::onemap::OneMapGeocoder;
pub use weather_data::provider::{
    GeocodingProvider, HistoricalCorpusLoader, StaticReadings, StationReadingProvider,
};
pub use weather_data::retry::RetryPolicy;
pub use weather_data::snapshot_cache::{Snapshot, SnapshotCache};
