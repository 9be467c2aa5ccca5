//! Historical baseline: one composite heat score per calendar date, conditioned on the
//! stations nearest to a query point.

use crate::scoring::error::ScoringError;
use crate::scoring::heat_score::weighted_sum;
use crate::stations::locate_station::StationLocator;
use crate::types::hotspot::DailyWeightedScore;
use crate::types::lat_lon::LatLon;
use crate::types::station_reading::NormalizedReading;
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Restricts a baseline to historical dates near a reference date in the calendar year.
///
/// Dates are compared by month and day, wrapping around the year boundary, so a window of
/// 15 days around 5 January also admits late December. 29 February counts as 28 February in
/// common years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalWindow {
    pub reference: NaiveDate,
    pub days: u32,
}

impl SeasonalWindow {
    pub fn new(reference: NaiveDate, days: u32) -> Self {
        Self { reference, days }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let year = self.reference.year();
        (year - 1..=year + 1)
            .filter_map(|y| same_day_in(date, y))
            .map(|projected| (projected - self.reference).num_days().unsigned_abs())
            .min()
            .is_some_and(|distance| distance <= u64::from(self.days))
    }
}

fn same_day_in(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day().saturating_sub(1)))
}

/// Builds the per-date composite score distribution for a query point.
///
/// Rows whose station is not in `nearest_station_ids` are dropped. The rest are grouped by
/// date, and each date is weighted on its own because not every station reports every day.
/// The output is ordered by date.
///
/// # Errors
///
/// Returns [`ScoringError::HistoricalWeighting`] if a historical row sits exactly on the query
/// point or has unusable coordinates.
pub fn build_distribution(
    corpus: &[NormalizedReading],
    nearest_station_ids: &[&str],
    query: LatLon,
) -> Result<Vec<DailyWeightedScore>, ScoringError> {
    distribution_matching(corpus, nearest_station_ids, query, |_| true)
}

/// Same as [`build_distribution`], keeping only dates inside `window`.
pub fn build_seasonal_distribution(
    corpus: &[NormalizedReading],
    nearest_station_ids: &[&str],
    query: LatLon,
    window: SeasonalWindow,
) -> Result<Vec<DailyWeightedScore>, ScoringError> {
    distribution_matching(corpus, nearest_station_ids, query, |date| {
        window.contains(date)
    })
}

fn distribution_matching(
    corpus: &[NormalizedReading],
    nearest_station_ids: &[&str],
    query: LatLon,
    keep_date: impl Fn(NaiveDate) -> bool,
) -> Result<Vec<DailyWeightedScore>, ScoringError> {
    let stations: HashSet<&str> = nearest_station_ids.iter().copied().collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<&NormalizedReading>> = BTreeMap::new();
    for row in corpus {
        if stations.contains(row.station_id()) && keep_date(row.reading.date) {
            by_date.entry(row.reading.date).or_default().push(row);
        }
    }

    let locator = StationLocator::new(query);
    let mut distribution = Vec::with_capacity(by_date.len());
    for (date, rows) in by_date {
        let weights = locator
            .weigh(&rows)
            .map_err(|source| ScoringError::HistoricalWeighting { date, source })?;
        let scores: Vec<f64> = rows.iter().map(|row| row.heat_score_norm).collect();
        distribution.push(DailyWeightedScore {
            date,
            weighted_heat_score: weighted_sum(&weights, &scores),
        });
    }

    debug!(
        "Built historical distribution of {} days for stations {:?}",
        distribution.len(),
        nearest_station_ids
    );
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::error::LocateStationError;
    use crate::test_support::reading;

    fn row(id: &str, lat: f64, date: &str, heat_score_norm: f64) -> NormalizedReading {
        NormalizedReading {
            reading: reading(id, lat, 103.8, 30.0, 70.0, 2.0, date),
            air_temp_norm: 0.0,
            humidity_norm: 0.0,
            wind_speed_norm: 0.0,
            heat_score: 0.0,
            heat_score_norm,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // Query at latitude 0.01: station A (lat 0.0) is half as far as station B (lat 0.03),
    // so A weighs 2/3 and B 1/3 on days both reported.
    const QUERY: LatLon = LatLon(0.01, 103.8);

    #[test]
    fn test_groups_by_date_and_weights_within_each_day() {
        let corpus = vec![
            row("A", 0.0, "2024-01-02", 0.6),
            row("B", 0.03, "2024-01-01", 0.9),
            row("A", 0.0, "2024-01-01", 0.3),
            row("B", 0.03, "2024-01-02", 0.0),
        ];
        let distribution = build_distribution(&corpus, &["A", "B"], QUERY).unwrap();

        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution[0].date, date("2024-01-01"));
        assert!((distribution[0].weighted_heat_score - 0.5).abs() < 1e-6);
        assert_eq!(distribution[1].date, date("2024-01-02"));
        assert!((distribution[1].weighted_heat_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_day_with_single_reporting_station_uses_full_weight() {
        let corpus = vec![
            row("A", 0.0, "2024-01-01", 0.3),
            row("B", 0.03, "2024-01-02", 0.9),
        ];
        let distribution = build_distribution(&corpus, &["A", "B"], QUERY).unwrap();
        assert!((distribution[0].weighted_heat_score - 0.3).abs() < 1e-12);
        assert!((distribution[1].weighted_heat_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_ignores_stations_outside_the_selection() {
        let corpus = vec![
            row("A", 0.0, "2024-01-01", 0.3),
            row("Z", 0.02, "2024-01-01", 1.0),
            row("Z", 0.02, "2024-01-03", 1.0),
        ];
        let distribution = build_distribution(&corpus, &["A"], QUERY).unwrap();
        assert_eq!(distribution.len(), 1);
        assert!((distribution[0].weighted_heat_score - 0.3).abs() < 1e-12);

        assert!(build_distribution(&corpus, &["Q"], QUERY).unwrap().is_empty());
    }

    #[test]
    fn test_co_located_historical_row_is_reported() {
        let corpus = vec![row("A", 0.01, "2024-01-01", 0.3)];
        let err = build_distribution(&corpus, &["A"], QUERY).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::HistoricalWeighting {
                source: LocateStationError::DegenerateDistance { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_seasonal_window_wraps_year_end() {
        let window = SeasonalWindow::new(date("2025-01-05"), 15);
        assert!(window.contains(date("2021-12-25")));
        assert!(window.contains(date("2022-01-20")));
        assert!(!window.contains(date("2022-01-21")));
        assert!(!window.contains(date("2022-07-01")));
    }

    #[test]
    fn test_seasonal_window_counts_real_calendar_days() {
        // 31 December of a leap year is one day from 1 January.
        let window = SeasonalWindow::new(date("2024-12-31"), 0);
        assert!(window.contains(date("2021-12-31")));
        assert!(!window.contains(date("2022-01-01")));
        assert!(SeasonalWindow::new(date("2024-12-31"), 1).contains(date("2022-01-01")));

        let window = SeasonalWindow::new(date("2025-03-01"), 1);
        assert!(window.contains(date("2024-02-29")));
        assert!(!SeasonalWindow::new(date("2025-03-02"), 1).contains(date("2024-02-29")));
    }

    #[test]
    fn test_seasonal_distribution_filters_dates() {
        let corpus = vec![
            row("A", 0.0, "2023-01-10", 0.2),
            row("A", 0.0, "2023-07-10", 0.9),
            row("A", 0.0, "2023-12-30", 0.4),
        ];
        let window = SeasonalWindow::new(date("2025-01-03"), 10);
        let distribution = build_seasonal_distribution(&corpus, &["A"], QUERY, window).unwrap();
        let dates: Vec<NaiveDate> = distribution.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date("2023-01-10"), date("2023-12-30")]);
    }
}
