//! Risk categories for the UV index, with the advice shown alongside each.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exposure category of a UV index reading.
///
/// Bands follow the integer scale the index is reported on: `0–2` Low, `3–5` Moderate,
/// `6–7` High, `8–10` Very High and `11+` Extreme. Fractional readings are rounded first.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum UvRisk {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Extreme,
}

impl UvRisk {
    /// Maps a UV index onto its risk band. `None` for non-finite input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use heatspot::UvRisk;
    ///
    /// assert_eq!(UvRisk::from_index(0.0), Some(UvRisk::Low));
    /// assert_eq!(UvRisk::from_index(9.0), Some(UvRisk::VeryHigh));
    /// assert_eq!(UvRisk::from_index(f64::NAN), None);
    /// ```
    pub fn from_index(index: f64) -> Option<Self> {
        if !index.is_finite() {
            return None;
        }
        let index = index.round();
        let risk = if index <= 2.0 {
            UvRisk::Low
        } else if index <= 5.0 {
            UvRisk::Moderate
        } else if index <= 7.0 {
            UvRisk::High
        } else if index <= 10.0 {
            UvRisk::VeryHigh
        } else {
            UvRisk::Extreme
        };
        Some(risk)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvRisk::Low => "Low",
            UvRisk::Moderate => "Moderate",
            UvRisk::High => "High",
            UvRisk::VeryHigh => "Very High",
            UvRisk::Extreme => "Extreme",
        }
    }

    /// Protective advice for this level of exposure.
    pub fn advice(&self) -> &'static str {
        match self {
            UvRisk::Low => "Feel free to go out and play!",
            UvRisk::Moderate => "Use sunscreen (at least SPF 30) and sunglasses.",
            UvRisk::High => "Stay in shade during midday.",
            UvRisk::VeryHigh => "Reduce time in the sun!",
            UvRisk::Extreme => "Avoid being outside!",
        }
    }
}

impl fmt::Display for UvRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
