//! Weight estimation from age or length.
//!
//! Decision order: age first (dedicated infant formula under 12 months,
//! method-selected regression otherwise), then Broselow-style length
//! zones, then an ideal-body-weight-by-length fallback. Returns `None`
//! when the profile has neither age nor length.

use crate::types::PatientProfile;
use serde::{Deserialize, Serialize};

/// Selectable age-regression method for children 12 months and older
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    #[default]
    Standard,
    Apls,
    Erc,
    Luscombe,
}

impl EstimationMethod {
    /// Parse a CLI/config name into a method
    pub fn parse_name(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "standard" => Some(EstimationMethod::Standard),
            "apls" => Some(EstimationMethod::Apls),
            "erc" => Some(EstimationMethod::Erc),
            "luscombe" => Some(EstimationMethod::Luscombe),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EstimationMethod::Standard => "standard",
            EstimationMethod::Apls => "apls",
            EstimationMethod::Erc => "erc",
            EstimationMethod::Luscombe => "luscombe",
        }
    }
}

/// One Broselow-style length zone mapping a length band to a weight range
struct LengthZone {
    min_cm: f64,
    max_cm: f64,
    weight_lo_kg: f64,
    weight_hi_kg: f64,
}

/// Length zones, ordered ascending; each band is `[min_cm, max_cm)`
const LENGTH_ZONES: &[LengthZone] = &[
    LengthZone { min_cm: 46.0, max_cm: 55.0, weight_lo_kg: 3.0, weight_hi_kg: 5.0 },
    LengthZone { min_cm: 55.0, max_cm: 60.0, weight_lo_kg: 6.0, weight_hi_kg: 7.0 },
    LengthZone { min_cm: 60.0, max_cm: 67.0, weight_lo_kg: 8.0, weight_hi_kg: 9.0 },
    LengthZone { min_cm: 67.0, max_cm: 75.0, weight_lo_kg: 10.0, weight_hi_kg: 11.0 },
    LengthZone { min_cm: 75.0, max_cm: 85.0, weight_lo_kg: 12.0, weight_hi_kg: 14.0 },
    LengthZone { min_cm: 85.0, max_cm: 95.0, weight_lo_kg: 15.0, weight_hi_kg: 18.0 },
    LengthZone { min_cm: 95.0, max_cm: 107.0, weight_lo_kg: 19.0, weight_hi_kg: 22.0 },
    LengthZone { min_cm: 107.0, max_cm: 124.0, weight_lo_kg: 24.0, weight_hi_kg: 28.0 },
    LengthZone { min_cm: 124.0, max_cm: 143.0, weight_lo_kg: 30.0, weight_hi_kg: 36.0 },
];

/// Estimate the patient's weight in kilograms.
///
/// The estimate is returned to the caller only; it is never written back
/// into the stored profile.
pub fn estimate(profile: &PatientProfile, method: EstimationMethod) -> Option<f64> {
    if let Some(months) = profile.age_months {
        if months < 12.0 {
            return Some(infant_weight(months));
        }
        return Some(regression(method, months / 12.0));
    }

    if let Some(length) = profile.length_cm {
        return Some(weight_from_length(length));
    }

    None
}

/// Infant formula for under 12 months: steeper growth curve than any of
/// the child regressions
fn infant_weight(age_months: f64) -> f64 {
    0.5 * age_months + 4.0
}

/// Method-selected regression over age in years (12 months and up)
fn regression(method: EstimationMethod, age_years: f64) -> f64 {
    match method {
        EstimationMethod::Standard | EstimationMethod::Erc => 2.0 * (age_years + 4.0),
        EstimationMethod::Apls => {
            if age_years < 6.0 {
                2.0 * age_years + 8.0
            } else {
                3.0 * age_years + 7.0
            }
        }
        EstimationMethod::Luscombe => 3.0 * age_years + 7.0,
    }
}

/// Look the length up in the ordered zone table and take the midpoint of
/// the matched zone's weight range; fall back to ideal body weight when
/// the length falls outside every zone
fn weight_from_length(length_cm: f64) -> f64 {
    for zone in LENGTH_ZONES {
        if length_cm >= zone.min_cm && length_cm < zone.max_cm {
            return (zone.weight_lo_kg + zone.weight_hi_kg) / 2.0;
        }
    }
    ideal_body_weight(length_cm)
}

/// Traub-Johnson ideal body weight by length
fn ideal_body_weight(length_cm: f64) -> f64 {
    2.396 * (0.01863 * length_cm).exp()
}
