//! Min-max feature scaling with a strict train/apply split.
//!
//! [`NormalizationModel::fit`] is the only place scales are learned. Everything downstream
//! receives the frozen model by reference and can only apply it.

use crate::normalize::error::NormalizeError;
use crate::scoring::heat_score::heat_score;
use crate::types::station_reading::{NormalizedReading, StationReading};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A fitted `(min, max)` pair for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScale {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScale {
    /// Returns `None` for an empty input.
    fn fit(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, value| match acc {
            None => Some(MinMaxScale {
                min: value,
                max: value,
            }),
            Some(scale) => Some(MinMaxScale {
                min: scale.min.min(value),
                max: scale.max.max(value),
            }),
        })
    }

    /// `(x - min) / (max - min)`. Values outside the fitted range extrapolate linearly.
    /// A constant column (`max == min`) scales every value to `0`.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        (value - self.min) / range
    }
}

/// Per-feature scales fitted once on the historical corpus.
///
/// The heat-score scale is fitted in a second stage, over heat scores derived from the
/// already-scaled features, so the two stages must always run in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationModel {
    air_temp: MinMaxScale,
    humidity: MinMaxScale,
    wind_speed: MinMaxScale,
    heat_score: MinMaxScale,
}

impl NormalizationModel {
    /// Fits the feature scales, then the heat-score scale, over the full corpus.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::EmptyCorpus`] for an empty corpus and
    /// [`NormalizeError::NonFiniteValue`] if any feature is NaN or infinite.
    pub fn fit(corpus: &[StationReading]) -> Result<Self, NormalizeError> {
        for reading in corpus {
            check_finite(reading)?;
        }

        let air_temp =
            MinMaxScale::fit(corpus.iter().map(|r| r.air_temp)).ok_or(NormalizeError::EmptyCorpus)?;
        let humidity =
            MinMaxScale::fit(corpus.iter().map(|r| r.humidity)).ok_or(NormalizeError::EmptyCorpus)?;
        let wind_speed = MinMaxScale::fit(corpus.iter().map(|r| r.wind_speed))
            .ok_or(NormalizeError::EmptyCorpus)?;

        let heat_score = MinMaxScale::fit(corpus.iter().map(|r| {
            heat_score(
                air_temp.scale(r.air_temp),
                humidity.scale(r.humidity),
                wind_speed.scale(r.wind_speed),
            )
        }))
        .ok_or(NormalizeError::EmptyCorpus)?;

        let model = NormalizationModel {
            air_temp,
            humidity,
            wind_speed,
            heat_score,
        };
        info!(
            "Fitted normalization model on {} readings: airTemp [{}, {}], humidity [{}, {}], windSpeed [{}, {}], heat_score [{:.4}, {:.4}]",
            corpus.len(),
            air_temp.min,
            air_temp.max,
            humidity.min,
            humidity.max,
            wind_speed.min,
            wind_speed.max,
            heat_score.min,
            heat_score.max
        );
        Ok(model)
    }

    /// Applies the frozen scales to one reading.
    pub fn transform_reading(&self, reading: StationReading) -> NormalizedReading {
        let air_temp_norm = self.air_temp.scale(reading.air_temp);
        let humidity_norm = self.humidity.scale(reading.humidity);
        let wind_speed_norm = self.wind_speed.scale(reading.wind_speed);
        let heat_score = heat_score(air_temp_norm, humidity_norm, wind_speed_norm);
        NormalizedReading {
            reading,
            air_temp_norm,
            humidity_norm,
            wind_speed_norm,
            heat_score,
            heat_score_norm: self.heat_score.scale(heat_score),
        }
    }

    /// Applies the frozen scales to every reading. Never refits.
    pub fn transform(&self, readings: &[StationReading]) -> Vec<NormalizedReading> {
        readings
            .iter()
            .cloned()
            .map(|reading| self.transform_reading(reading))
            .collect()
    }

    pub fn air_temp(&self) -> MinMaxScale {
        self.air_temp
    }

    pub fn humidity(&self) -> MinMaxScale {
        self.humidity
    }

    pub fn wind_speed(&self) -> MinMaxScale {
        self.wind_speed
    }

    pub fn heat_score(&self) -> MinMaxScale {
        self.heat_score
    }
}

fn check_finite(reading: &StationReading) -> Result<(), NormalizeError> {
    let features = [
        ("airTemp", reading.air_temp),
        ("humidity", reading.humidity),
        ("windSpeed", reading.wind_speed),
    ];
    match features.into_iter().find(|(_, value)| !value.is_finite()) {
        Some((feature, value)) => Err(NormalizeError::NonFiniteValue {
            station: reading.station_id.clone(),
            feature,
            value,
            date: reading.date,
        }),
        None => Ok(()),
    }
}

/// Write-once holder for the process-wide [`NormalizationModel`].
///
/// The model can be fitted exactly once. Any later `fit` call fails instead of silently
/// replacing the scales that earlier transforms were computed with.
#[derive(Debug, Default)]
pub struct FeatureNormalizer {
    model: OnceLock<NormalizationModel>,
}

impl FeatureNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&self, corpus: &[StationReading]) -> Result<&NormalizationModel, NormalizeError> {
        if self.model.get().is_some() {
            return Err(NormalizeError::AlreadyFitted);
        }
        let model = NormalizationModel::fit(corpus)?;
        self.model
            .set(model)
            .map_err(|_| NormalizeError::AlreadyFitted)?;
        self.model()
    }

    pub fn model(&self) -> Result<&NormalizationModel, NormalizeError> {
        self.model.get().ok_or(NormalizeError::NotFitted)
    }

    pub fn is_fitted(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn transform(
        &self,
        readings: &[StationReading],
    ) -> Result<Vec<NormalizedReading>, NormalizeError> {
        Ok(self.model()?.transform(readings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;

    fn corpus() -> Vec<StationReading> {
        vec![
            reading("S1", 0.0, 0.0, 25.0, 60.0, 2.0, "2024-01-01"),
            reading("S2", 0.0, 0.0, 30.0, 90.0, 1.0, "2024-01-01"),
            reading("S1", 0.0, 0.0, 27.0, 75.0, 5.0, "2024-01-02"),
        ]
    }

    #[test]
    fn test_fit_feature_ranges() {
        let model = NormalizationModel::fit(&corpus()).unwrap();
        assert_eq!(model.air_temp(), MinMaxScale { min: 25.0, max: 30.0 });
        assert_eq!(model.humidity(), MinMaxScale { min: 60.0, max: 90.0 });
        assert_eq!(model.wind_speed(), MinMaxScale { min: 1.0, max: 5.0 });
    }

    #[test]
    fn test_heat_score_scale_fitted_on_normalized_features() {
        let model = NormalizationModel::fit(&corpus()).unwrap();
        // Row heat scores: 0 + 0 - 0.25, 1 + 1 - 0, 0.4 + 0.5 - 1.
        let scale = model.heat_score();
        assert!((scale.min - (-0.25)).abs() < 1e-12);
        assert!((scale.max - 2.0).abs() < 1e-12);

        let normalized = model.transform(&corpus());
        assert!((normalized[0].heat_score_norm - 0.0).abs() < 1e-12);
        assert!((normalized[1].heat_score_norm - 1.0).abs() < 1e-12);
        assert!((normalized[2].heat_score - (-0.1)).abs() < 1e-12);
        assert!((normalized[2].heat_score_norm - 0.15 / 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let flat = vec![
            reading("S1", 0.0, 0.0, 28.0, 60.0, 3.0, "2024-01-01"),
            reading("S2", 0.0, 0.0, 30.0, 70.0, 3.0, "2024-01-01"),
        ];
        let model = NormalizationModel::fit(&flat).unwrap();
        let out = model.transform(&[reading("S3", 0.0, 0.0, 29.0, 65.0, 9.0, "2024-01-02")]);
        assert_eq!(out[0].wind_speed_norm, 0.0);
        assert!(out[0].heat_score_norm.is_finite());
    }

    #[test]
    fn test_out_of_range_values_extrapolate() {
        let model = NormalizationModel::fit(&corpus()).unwrap();
        let out = model.transform(&[reading("S9", 0.0, 0.0, 35.0, 45.0, 0.0, "2024-02-01")]);
        assert!((out[0].air_temp_norm - 2.0).abs() < 1e-12);
        assert!((out[0].humidity_norm - (-0.5)).abs() < 1e-12);
        assert!((out[0].wind_speed_norm - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_repeatable() {
        let model = NormalizationModel::fit(&corpus()).unwrap();
        let live = vec![reading("S1", 0.0, 0.0, 29.5, 81.0, 2.5, "2024-03-01")];
        let first = model.transform(&live);
        let second = model.transform(&live);
        assert_eq!(first, second);
        assert_eq!(model, NormalizationModel::fit(&corpus()).unwrap());
    }

    #[test]
    fn test_heat_score_monotonic_in_features() {
        let model = NormalizationModel::fit(&corpus()).unwrap();
        let base = model.transform_reading(reading("S1", 0.0, 0.0, 27.0, 70.0, 3.0, "2024-03-01"));
        let hotter =
            model.transform_reading(reading("S1", 0.0, 0.0, 27.5, 70.0, 3.0, "2024-03-01"));
        let windier =
            model.transform_reading(reading("S1", 0.0, 0.0, 27.0, 70.0, 3.5, "2024-03-01"));
        assert!(hotter.heat_score > base.heat_score);
        assert!(hotter.heat_score_norm > base.heat_score_norm);
        assert!(windier.heat_score < base.heat_score);
        assert!(windier.heat_score_norm < base.heat_score_norm);
    }

    #[test]
    fn test_fit_rejects_empty_and_non_finite() {
        assert_eq!(NormalizationModel::fit(&[]), Err(NormalizeError::EmptyCorpus));

        let mut bad = corpus();
        bad[1].humidity = f64::NAN;
        match NormalizationModel::fit(&bad) {
            Err(NormalizeError::NonFiniteValue {
                station, feature, ..
            }) => {
                assert_eq!(station, "S2");
                assert_eq!(feature, "humidity");
            }
            other => panic!("expected NonFiniteValue, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_normalizer_fits_once() {
        let normalizer = FeatureNormalizer::new();
        assert!(!normalizer.is_fitted());
        assert_eq!(
            normalizer.transform(&corpus()),
            Err(NormalizeError::NotFitted)
        );

        normalizer.fit(&corpus()).unwrap();
        assert!(normalizer.is_fitted());
        assert_eq!(
            normalizer.fit(&corpus()).unwrap_err(),
            NormalizeError::AlreadyFitted
        );
        assert_eq!(normalizer.transform(&corpus()).unwrap().len(), 3);
    }
}
