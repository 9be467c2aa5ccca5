//! Heat-score arithmetic: the per-reading score and the inverse-distance composite.

use crate::types::station_reading::{StationReading, WeightedStation};

/// Per-reading heat score from normalized features.
///
/// Temperature and humidity raise the score, wind lowers it. The inputs are expected on the
/// fitted 0–1 scale so no feature dominates through its units.
pub fn heat_score(air_temp_norm: f64, humidity_norm: f64, wind_speed_norm: f64) -> f64 {
    air_temp_norm + humidity_norm - wind_speed_norm
}

/// Dot product of weights and normalized heat scores.
pub fn weighted_sum(weights: &[f64], heat_scores_norm: &[f64]) -> f64 {
    weights
        .iter()
        .zip(heat_scores_norm)
        .map(|(weight, score)| weight * score)
        .sum()
}

/// Composite heat score of a weighted station set: `Σ weight · heat_score_norm`.
pub fn composite_score(stations: &[WeightedStation]) -> f64 {
    stations
        .iter()
        .map(|s| s.weight * s.station.heat_score_norm)
        .sum()
}

/// Linear WBGT approximation from raw readings, rounded to 3 decimals.
pub fn estimate_heat_stress(air_temp: f64, wind_speed: f64, humidity: f64) -> f64 {
    let wbgt = 0.726330 * air_temp + 0.012713 * wind_speed + 0.109697 * humidity - 5.12977;
    (wbgt * 1000.0).round() / 1000.0
}

pub fn reading_heat_stress(reading: &StationReading) -> f64 {
    estimate_heat_stress(reading.air_temp, reading.wind_speed, reading.humidity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;
    use crate::types::station_reading::NormalizedReading;

    fn weighted(id: &str, heat_score_norm: f64, weight: f64) -> WeightedStation {
        WeightedStation {
            station: NormalizedReading {
                reading: reading(id, 0.0, 0.0, 30.0, 70.0, 2.0, "2024-01-01"),
                air_temp_norm: 0.0,
                humidity_norm: 0.0,
                wind_speed_norm: 0.0,
                heat_score: 0.0,
                heat_score_norm,
            },
            distance: 1.0,
            weight,
        }
    }

    #[test]
    fn test_heat_score_direction() {
        assert_eq!(heat_score(0.5, 0.5, 0.5), 0.5);
        assert!(heat_score(0.6, 0.5, 0.5) > heat_score(0.5, 0.5, 0.5));
        assert!(heat_score(0.5, 0.6, 0.5) > heat_score(0.5, 0.5, 0.5));
        assert!(heat_score(0.5, 0.5, 0.6) < heat_score(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_composite_score_is_weighted_dot_product() {
        let stations = vec![
            weighted("A", 0.9, 0.5),
            weighted("B", 0.3, 0.3),
            weighted("C", 0.1, 0.2),
        ];
        let expected = 0.9 * 0.5 + 0.3 * 0.3 + 0.1 * 0.2;
        assert!((composite_score(&stations) - expected).abs() < 1e-12);
        assert!((weighted_sum(&[0.5, 0.3, 0.2], &[0.9, 0.3, 0.1]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_composite_of_uniform_scores_is_that_score() {
        let stations = vec![weighted("A", 0.42, 0.7), weighted("B", 0.42, 0.3)];
        assert!((composite_score(&stations) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_heat_stress() {
        // 0.72633 * 30 + 0.012713 * 2 + 0.109697 * 70 - 5.12977 = 24.364346
        assert_eq!(estimate_heat_stress(30.0, 2.0, 70.0), 24.364);
    }
}
