use crate::config::HeatspotConfig;
use crate::error::HeatspotError;
use crate::normalize::feature_normalizer::NormalizationModel;
use crate::scoring::baseline::{build_distribution, build_seasonal_distribution, SeasonalWindow};
use crate::scoring::classifier::{classify, DEFAULT_PERCENTILE_THRESHOLD};
use crate::scoring::error::ScoringError;
use crate::scoring::heat_score::{composite_score, reading_heat_stress};
use crate::stations::locate_station::StationLocator;
use crate::types::compass_direction::CompassDirection;
use crate::types::hotspot::{AssessedStation, DailyWeightedScore, HotspotAssessment, HotspotResult};
use crate::types::lat_lon::LatLon;
use crate::types::station_reading::{NormalizedReading, WeightedStation};
use crate::types::uv_risk::UvRisk;
use crate::weather_data::corpus_loader::CsvCorpusLoader;
use crate::weather_data::data_gov_sg::DataGovSgProvider;
use crate::weather_data::onemap::OneMapGeocoder;
use crate::weather_data::provider::{
    GeocodingProvider, HistoricalCorpusLoader, StationReadingProvider,
};
use crate::weather_data::snapshot_cache::{Snapshot, SnapshotCache, DEFAULT_SNAPSHOT_TTL};
use bon::bon;
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Number of nearest stations interpolated per query unless configured otherwise.
pub const DEFAULT_STATION_COUNT: usize = 3;

/// The hotspot detection engine.
///
/// Holds the normalized historical corpus and its frozen [`NormalizationModel`], both built
/// once at construction, plus a TTL cache of the live station snapshot. Every query
/// recomputes its nearest stations, composite score and historical baseline from those.
///
/// # Examples
///
/// ```rust,no_run
/// # use heatspot::{Heatspot, HeatspotError, LatLon};
/// # async fn run() -> Result<(), HeatspotError> {
/// let engine = Heatspot::from_config(&Default::default()).await?;
/// let result = engine
///     .classify_hotspot()
///     .location(LatLon(1.3521, 103.8198))
///     .call()
///     .await?;
/// println!("hotspot: {} (percentile {:.1})", result.is_hotspot, result.percentile);
/// # Ok(())
/// # }
/// ```
pub struct Heatspot {
    model: NormalizationModel,
    corpus: Vec<NormalizedReading>,
    snapshot: SnapshotCache,
    geocoder: Option<Arc<dyn GeocodingProvider>>,
    station_count: usize,
    percentile_threshold: f64,
    seasonal_window_days: Option<u32>,
}

impl std::fmt::Debug for Heatspot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heatspot")
            .field("model", &self.model)
            .field("corpus_rows", &self.corpus.len())
            .field("snapshot", &self.snapshot)
            .field("has_geocoder", &self.geocoder.is_some())
            .field("station_count", &self.station_count)
            .field("percentile_threshold", &self.percentile_threshold)
            .field("seasonal_window_days", &self.seasonal_window_days)
            .finish()
    }
}

#[bon]
impl Heatspot {
    /// Loads the historical corpus, fits the normalization model and prepares the snapshot
    /// cache. The live feed is not contacted until the first query.
    ///
    /// # Errors
    ///
    /// Returns [`HeatspotError::WeatherData`] if the corpus cannot be loaded, and
    /// [`HeatspotError::Normalize`] if it is empty or holds non-finite values.
    #[builder]
    pub async fn new(
        corpus_loader: Arc<dyn HistoricalCorpusLoader>,
        provider: Arc<dyn StationReadingProvider>,
        geocoder: Option<Arc<dyn GeocodingProvider>>,
        snapshot_ttl: Option<Duration>,
        station_count: Option<usize>,
        percentile_threshold: Option<f64>,
        seasonal_window_days: Option<u32>,
    ) -> Result<Self, HeatspotError> {
        let history = corpus_loader.load().await?;
        let model = NormalizationModel::fit(&history)?;
        let corpus = model.transform(&history);
        info!(
            "Heat engine ready with {} normalized historical readings",
            corpus.len()
        );

        Ok(Self {
            model,
            corpus,
            snapshot: SnapshotCache::new(provider, snapshot_ttl.unwrap_or(DEFAULT_SNAPSHOT_TTL)),
            geocoder,
            station_count: station_count.unwrap_or(DEFAULT_STATION_COUNT),
            percentile_threshold: percentile_threshold.unwrap_or(DEFAULT_PERCENTILE_THRESHOLD),
            seasonal_window_days,
        })
    }

    /// Builds an engine wired to the CSV corpus, the data.gov.sg feed and the OneMap geocoder
    /// described by `config`.
    pub async fn from_config(config: &HeatspotConfig) -> Result<Self, HeatspotError> {
        config.validate()?;
        let upstream = &config.upstream;
        let provider = DataGovSgProvider::builder()
            .base_url(upstream.data_gov_base_url.clone())
            .retry(upstream.retry_policy())
            .timeout(upstream.request_timeout())
            .build()?;
        let geocoder = OneMapGeocoder::builder()
            .search_url(upstream.onemap_search_url.clone())
            .maybe_api_key(upstream.onemap_key.clone())
            .retry(upstream.retry_policy())
            .timeout(upstream.request_timeout())
            .build()?;

        Self::builder()
            .corpus_loader(Arc::new(CsvCorpusLoader::new(&config.corpus_path)))
            .provider(Arc::new(provider))
            .geocoder(Arc::new(geocoder))
            .snapshot_ttl(config.snapshot_ttl())
            .station_count(config.station_count)
            .percentile_threshold(config.percentile_threshold)
            .maybe_seasonal_window_days(config.seasonal_window_days)
            .build()
            .await
    }

    /// The frozen model fitted on the historical corpus.
    pub fn model(&self) -> &NormalizationModel {
        &self.model
    }

    /// The historical corpus, normalized once at construction and ordered by date.
    pub fn corpus(&self) -> &[NormalizedReading] {
        &self.corpus
    }

    pub fn station_count(&self) -> usize {
        self.station_count
    }

    /// The live snapshot, refetched when older than the configured TTL.
    pub async fn current_snapshot(&self) -> Result<Arc<Snapshot>, HeatspotError> {
        Ok(self.snapshot.get().await?)
    }

    async fn current_readings(&self) -> Result<Vec<NormalizedReading>, HeatspotError> {
        let snapshot = self.current_snapshot().await?;
        Ok(self.model.transform(&snapshot.readings))
    }

    /// The `k` live stations nearest to `location`, with inverse-distance weights.
    pub async fn nearest_stations(
        &self,
        location: LatLon,
        k: usize,
    ) -> Result<Vec<WeightedStation>, HeatspotError> {
        let readings = self.current_readings().await?;
        Ok(StationLocator::new(location).nearest(&readings, k)?)
    }

    /// Current composite heat score at `location`, interpolated from the configured number of
    /// nearest stations.
    pub async fn composite_score_for_query(&self, location: LatLon) -> Result<f64, HeatspotError> {
        let nearest = self.nearest_stations(location, self.station_count).await?;
        Ok(composite_score(&nearest))
    }

    /// Per-date composite scores of the given stations' history, as seen from `location`.
    ///
    /// With a seasonal window configured, only dates near `reference` in the calendar year
    /// are kept.
    pub fn historical_distribution(
        &self,
        location: LatLon,
        stations: &[WeightedStation],
        reference: NaiveDate,
    ) -> Result<Vec<DailyWeightedScore>, HeatspotError> {
        let ids: Vec<&str> = stations.iter().map(|s| s.station_id()).collect();
        let distribution = match self.seasonal_window_days {
            Some(days) => build_seasonal_distribution(
                &self.corpus,
                &ids,
                location,
                SeasonalWindow::new(reference, days),
            )?,
            None => build_distribution(&self.corpus, &ids, location)?,
        };
        if distribution.is_empty() {
            return Err(ScoringError::InsufficientHistory {
                stations: ids.iter().map(|id| id.to_string()).collect(),
            }
            .into());
        }
        Ok(distribution)
    }

    async fn evaluate(
        &self,
        location: LatLon,
        percentile_threshold: f64,
    ) -> Result<(Arc<Snapshot>, Vec<WeightedStation>, HotspotResult), HeatspotError> {
        let snapshot = self.current_snapshot().await?;
        let readings = self.model.transform(&snapshot.readings);
        let nearest = StationLocator::new(location).nearest(&readings, self.station_count)?;
        let current = composite_score(&nearest);
        // `nearest` is never empty here, the locator rejects empty selections.
        let reference = nearest
            .first()
            .map(|s| s.station.reading.date)
            .unwrap_or_default();
        let distribution = self.historical_distribution(location, &nearest, reference)?;
        let result = classify(&distribution, current, percentile_threshold)?;
        debug!(
            "({}, {}): score {:.4}, threshold {:.4} at p{}, percentile {:.1}, hotspot {}",
            location.latitude(),
            location.longitude(),
            result.weighted_score,
            result.heat_threshold,
            percentile_threshold,
            result.percentile,
            result.is_hotspot
        );
        Ok((snapshot, nearest, result))
    }

    /// Classifies the current conditions at `location` against their own history.
    ///
    /// This method uses a builder pattern. `percentile_threshold` defaults to the engine's
    /// configured threshold (90 unless set).
    ///
    /// # Errors
    ///
    /// * [`HeatspotError::WeatherData`] if the live snapshot cannot be refreshed.
    /// * [`HeatspotError::LocateStation`] if a nearest station coincides with `location`.
    /// * [`HeatspotError::Scoring`] if the selected stations have no history or the threshold
    ///   is outside `[0, 100]`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use heatspot::{Heatspot, HeatspotError, LatLon};
    /// # async fn run(engine: Heatspot) -> Result<(), HeatspotError> {
    /// let result = engine
    ///     .classify_hotspot()
    ///     .location(LatLon(1.2966, 103.7764))
    ///     .percentile_threshold(95.0)
    ///     .call()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn classify_hotspot(
        &self,
        location: LatLon,
        percentile_threshold: Option<f64>,
    ) -> Result<HotspotResult, HeatspotError> {
        let percentile = percentile_threshold.unwrap_or(self.percentile_threshold);
        let (_, _, result) = self.evaluate(location, percentile).await?;
        Ok(result)
    }

    /// Classification plus the stations behind it, each annotated with its compass wind
    /// direction and heat-stress estimate. The snapshot's UV index, when reported, comes with
    /// its risk category.
    #[builder]
    pub async fn assess_location(
        &self,
        location: LatLon,
        percentile_threshold: Option<f64>,
    ) -> Result<HotspotAssessment, HeatspotError> {
        let percentile = percentile_threshold.unwrap_or(self.percentile_threshold);
        let (snapshot, nearest, result) = self.evaluate(location, percentile).await?;
        let stations = nearest
            .into_iter()
            .map(|station| AssessedStation {
                wind_direction_dir: station
                    .station
                    .reading
                    .wind_direction
                    .and_then(CompassDirection::from_degrees),
                heat_stress: reading_heat_stress(&station.station.reading),
                station,
            })
            .collect();
        Ok(HotspotAssessment {
            location,
            result,
            stations,
            uv_index: snapshot.uv_index,
            uv_risk: snapshot.uv_index.and_then(UvRisk::from_index),
        })
    }

    /// Resolves a postal code through the configured geocoder.
    pub async fn locate_postal_code(&self, postal_code: &str) -> Result<LatLon, HeatspotError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or(HeatspotError::GeocoderUnavailable)?;
        geocoder
            .resolve(postal_code)
            .await?
            .ok_or_else(|| HeatspotError::PostalCodeNotFound(postal_code.to_string()))
    }
}
