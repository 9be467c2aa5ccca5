//! Defines the `CompassDirection` enum, mapping wind directions reported in degrees
//! onto the 16 points of the compass rose.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 16 compass points, each covering a 22.5° sector.
///
/// Sectors start at 0° and run clockwise, so `N` covers `[0°, 22.5°)`, `NNE` covers
/// `[22.5°, 45°)` and so on up to `NNW` at `[337.5°, 360°)`.
///
/// Convert a reading in degrees with [`CompassDirection::from_degrees`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

const SECTORS: [CompassDirection; 16] = [
    CompassDirection::N,
    CompassDirection::NNE,
    CompassDirection::NE,
    CompassDirection::ENE,
    CompassDirection::E,
    CompassDirection::ESE,
    CompassDirection::SE,
    CompassDirection::SSE,
    CompassDirection::S,
    CompassDirection::SSW,
    CompassDirection::SW,
    CompassDirection::WSW,
    CompassDirection::W,
    CompassDirection::WNW,
    CompassDirection::NW,
    CompassDirection::NNW,
];

const SECTOR_WIDTH_DEGREES: f64 = 22.5;

impl CompassDirection {
    /// Maps a direction in degrees onto its compass sector.
    ///
    /// Values of 360° and above wrap around. Negative or non-finite input has no
    /// meaningful direction and yields `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use heatspot::CompassDirection;
    ///
    /// assert_eq!(CompassDirection::from_degrees(315.0), Some(CompassDirection::NW));
    /// assert_eq!(CompassDirection::from_degrees(360.0), Some(CompassDirection::N));
    /// assert_eq!(CompassDirection::from_degrees(f64::NAN), None);
    /// ```
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() || degrees < 0.0 {
            return None;
        }
        let section = ((degrees % 360.0) / SECTOR_WIDTH_DEGREES) as usize;
        SECTORS.get(section).copied()
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_boundaries() {
        assert_eq!(CompassDirection::from_degrees(0.0), Some(CompassDirection::N));
        assert_eq!(CompassDirection::from_degrees(22.4), Some(CompassDirection::N));
        assert_eq!(CompassDirection::from_degrees(22.5), Some(CompassDirection::NNE));
        assert_eq!(CompassDirection::from_degrees(180.0), Some(CompassDirection::S));
        assert_eq!(CompassDirection::from_degrees(359.9), Some(CompassDirection::NNW));
    }

    #[test]
    fn test_wraps_and_rejects() {
        assert_eq!(CompassDirection::from_degrees(405.0), Some(CompassDirection::NE));
        assert_eq!(CompassDirection::from_degrees(-10.0), None);
        assert_eq!(CompassDirection::from_degrees(f64::INFINITY), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CompassDirection::WSW.to_string(), "WSW");
    }
}
