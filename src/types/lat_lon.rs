use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are decimal degrees on the WGS-84 ellipsoid.
///
/// # Examples
///
/// ```
/// use heatspot::LatLon;
///
/// let ang_mo_kio = LatLon(1.3691, 103.8454);
/// assert_eq!(ang_mo_kio.0, 1.3691); // Latitude
/// assert_eq!(ang_mo_kio.1, 103.8454); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }
}
