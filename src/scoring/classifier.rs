//! Percentile inference over a historical score distribution.

use crate::scoring::error::ScoringError;
use crate::types::hotspot::{DailyWeightedScore, HotspotResult};
use ordered_float::OrderedFloat;

/// The percentile most callers classify against.
pub const DEFAULT_PERCENTILE_THRESHOLD: f64 = 90.0;

fn check_percentile(percentile: f64) -> Result<(), ScoringError> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(ScoringError::InvalidPercentile(percentile));
    }
    Ok(())
}

fn sorted(scores: &[f64]) -> Vec<f64> {
    let mut sorted = scores.to_vec();
    sorted.sort_by_key(|score| OrderedFloat(*score));
    sorted
}

/// Linear-interpolated percentile, with the rank taken as `p / 100 · (n − 1)` between the
/// closest sorted values.
///
/// Returns `None` for an empty slice.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidPercentile`] when `p` is outside `[0, 100]` or NaN.
pub fn percentile(scores: &[f64], p: f64) -> Result<Option<f64>, ScoringError> {
    check_percentile(p)?;
    if scores.is_empty() {
        return Ok(None);
    }
    let sorted = sorted(scores);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Ok(Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction))
}

/// Share of `scores` less than or equal to `score`, expressed 0–100.
///
/// Returns `None` for an empty slice.
pub fn percentile_rank(scores: &[f64], score: f64) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let at_or_below = scores.iter().filter(|s| **s <= score).count();
    Some(at_or_below as f64 / scores.len() as f64 * 100.0)
}

/// Ranks a current composite score against its historical distribution.
///
/// `heat_threshold` is the historical score at `percentile_threshold`; the location is a
/// hotspot when the current score is strictly above it.
///
/// # Errors
///
/// * [`ScoringError::InsufficientHistory`] for an empty distribution. No threshold is
///   invented for a location without history.
/// * [`ScoringError::InvalidPercentile`] for a threshold outside `[0, 100]`.
/// * [`ScoringError::NonFiniteScore`] when `current_score` is NaN or infinite.
pub fn classify(
    distribution: &[DailyWeightedScore],
    current_score: f64,
    percentile_threshold: f64,
) -> Result<HotspotResult, ScoringError> {
    check_percentile(percentile_threshold)?;
    if !current_score.is_finite() {
        return Err(ScoringError::NonFiniteScore(current_score));
    }

    let scores: Vec<f64> = distribution.iter().map(|d| d.weighted_heat_score).collect();
    let insufficient = || ScoringError::InsufficientHistory {
        stations: Vec::new(),
    };
    let heat_threshold = percentile(&scores, percentile_threshold)?.ok_or_else(insufficient)?;
    let rank = percentile_rank(&scores, current_score).ok_or_else(insufficient)?;

    Ok(HotspotResult {
        is_hotspot: current_score > heat_threshold,
        weighted_score: current_score,
        heat_threshold,
        percentile: rank,
    })
}
