use crate::stations::error::LocateStationError;
use crate::types::lat_lon::LatLon;
use crate::types::station_reading::{NormalizedReading, WeightedStation};
use geo::{Distance, Geodesic, Point};
use log::debug;
use ordered_float::OrderedFloat;

/// Ellipsoidal (WGS-84) geodesic distance between two coordinates, in kilometers.
pub fn geodesic_distance_km(from: LatLon, to: LatLon) -> f64 {
    let from = Point::new(from.longitude(), from.latitude());
    let to = Point::new(to.longitude(), to.latitude());
    Geodesic::distance(from, to) / 1000.0
}

/// Normalized inverse-distance weights: `(1 / d_i) / Σ(1 / d_j)`.
///
/// Callers must have rejected zero distances already.
pub fn inverse_distance_weights(distances_km: &[f64]) -> Vec<f64> {
    let inverse: Vec<f64> = distances_km.iter().map(|d| 1.0 / d).collect();
    let total: f64 = inverse.iter().sum();
    inverse.into_iter().map(|w| w / total).collect()
}

/// Locates and weights stations relative to one query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationLocator {
    query: LatLon,
}

impl StationLocator {
    pub fn new(query: LatLon) -> Self {
        Self { query }
    }

    pub fn query(&self) -> LatLon {
        self.query
    }

    /// Distance from the query point to a reading's station, rejecting co-located stations
    /// and coordinates the geodesic solver cannot handle.
    fn distance_to(&self, reading: &NormalizedReading) -> Result<f64, LocateStationError> {
        let distance_km = geodesic_distance_km(self.query, reading.location());
        if !distance_km.is_finite() {
            return Err(self.invalid_coordinate(reading));
        }
        if self.is_degenerate(reading, distance_km) {
            return Err(self.degenerate(reading));
        }
        Ok(distance_km)
    }

    fn is_degenerate(&self, reading: &NormalizedReading, distance_km: f64) -> bool {
        distance_km <= 0.0 || reading.location() == self.query
    }

    fn degenerate(&self, reading: &NormalizedReading) -> LocateStationError {
        LocateStationError::DegenerateDistance {
            station: reading.station_id().to_string(),
            latitude: self.query.latitude(),
            longitude: self.query.longitude(),
        }
    }

    fn invalid_coordinate(&self, reading: &NormalizedReading) -> LocateStationError {
        let location = reading.location();
        LocateStationError::InvalidCoordinate {
            station: reading.station_id().to_string(),
            latitude: location.latitude(),
            longitude: location.longitude(),
        }
    }

    /// Selects the `n_results` readings closest to the query point and weights them.
    ///
    /// Ties keep their input order. Asking for more stations than available returns all of
    /// them, weighted over the smaller set. Results are sorted by distance, closest first.
    ///
    /// # Errors
    ///
    /// * [`LocateStationError::NoStations`] if `readings` is empty or `n_results` is 0.
    /// * [`LocateStationError::DegenerateDistance`] if a selected station sits exactly on the
    ///   query point.
    pub fn nearest(
        &self,
        readings: &[NormalizedReading],
        n_results: usize,
    ) -> Result<Vec<WeightedStation>, LocateStationError> {
        if readings.is_empty() || n_results == 0 {
            return Err(LocateStationError::NoStations);
        }

        let mut candidates: Vec<(&NormalizedReading, f64)> = Vec::with_capacity(readings.len());
        for reading in readings {
            let distance_km = geodesic_distance_km(self.query, reading.location());
            if !distance_km.is_finite() {
                return Err(self.invalid_coordinate(reading));
            }
            candidates.push((reading, distance_km));
        }

        // `sort_by_key` is stable, so equidistant stations stay in input order.
        candidates.sort_by_key(|(_, distance_km)| OrderedFloat(*distance_km));
        candidates.truncate(n_results);

        // A zero distance is only an error for stations that end up selected.
        if let Some((reading, _)) = candidates
            .iter()
            .find(|(reading, distance_km)| self.is_degenerate(reading, *distance_km))
        {
            return Err(self.degenerate(reading));
        }

        let distances: Vec<f64> = candidates.iter().map(|(_, d)| *d).collect();
        let weights = inverse_distance_weights(&distances);

        debug!(
            "Selected {} of {} stations around ({}, {})",
            candidates.len(),
            readings.len(),
            self.query.latitude(),
            self.query.longitude()
        );

        Ok(candidates
            .into_iter()
            .zip(distances.into_iter().zip(weights))
            .map(|((reading, _), (distance, weight))| WeightedStation {
                station: reading.clone(),
                distance,
                weight,
            })
            .collect())
    }

    /// Inverse-distance weights for every given row, aligned with the input order.
    ///
    /// Unlike [`StationLocator::nearest`] nothing is dropped: all rows share the weight.
    pub fn weigh(&self, rows: &[&NormalizedReading]) -> Result<Vec<f64>, LocateStationError> {
        if rows.is_empty() {
            return Err(LocateStationError::NoStations);
        }
        let distances = rows
            .iter()
            .map(|reading| self.distance_to(reading))
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(inverse_distance_weights(&distances))
    }
}

/// Finds the `k` nearest stations to `query` and weights them by inverse distance.
///
/// Shorthand for [`StationLocator::nearest`].
pub fn nearest_stations(
    query: LatLon,
    readings: &[NormalizedReading],
    k: usize,
) -> Result<Vec<WeightedStation>, LocateStationError> {
    StationLocator::new(query).nearest(readings, k)
}
