//! Weight-based dose computation and formatting.
//!
//! A dose is the per-kg rate multiplied by weight, clamped to the spec's
//! hard ceiling when one exists. Display precision depends on the
//! magnitude of the computed value and must be stable: clinicians read
//! these strings under time pressure.

use crate::types::{DoseResult, DoseSpec};

/// Compute a formatted, capped dose for the given weight
pub fn calculate(weight_kg: f64, spec: &DoseSpec) -> DoseResult {
    let raw_min = spec.rate_per_kg_min * weight_kg;
    let raw_max = spec.rate_per_kg_max * weight_kg;

    let mut capped = false;
    let (dose_min, dose_max) = match spec.max_dose {
        Some(ceiling) => {
            let lo = if raw_min > ceiling {
                capped = true;
                ceiling
            } else {
                raw_min
            };
            let hi = if raw_max > ceiling {
                capped = true;
                ceiling
            } else {
                raw_max
            };
            (lo, hi)
        }
        None => (raw_min, raw_max),
    };

    let formatted = if (dose_max - dose_min).abs() < f64::EPSILON {
        format!("{} {}", format_quantity(dose_min), spec.unit)
    } else {
        format!(
            "{}\u{2013}{} {}",
            format_quantity(dose_min),
            format_quantity(dose_max),
            spec.unit
        )
    };

    DoseResult {
        indication: spec.indication.clone(),
        route: spec.route,
        formatted,
        dose_min,
        dose_max,
        unit: spec.unit.clone(),
        capped,
        weight_kg,
        weight_estimated: false,
        notes: spec.notes.clone(),
    }
}

/// Format a dose quantity with value-dependent precision.
///
/// Below 0.1 → 3 decimals, below 1 → 2, below 10 → 1, at 10 and above →
/// rounded integer. Trailing zeros are trimmed for values of 1 and above
/// (`5.0` renders `5`); sub-unit values keep their fixed decimals
/// (`0.10` stays `0.10`).
pub fn format_quantity(value: f64) -> String {
    if value < 0.1 {
        format!("{:.3}", value)
    } else if value < 1.0 {
        format!("{:.2}", value)
    } else if value < 10.0 {
        trim_trailing_zeros(format!("{:.1}", value))
    } else {
        format!("{}", value.round() as i64)
    }
}

fn trim_trailing_zeros(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;

    fn spec(rate_min: f64, rate_max: f64, max_dose: Option<f64>) -> DoseSpec {
        DoseSpec {
            indication: "test".into(),
            route: Route::Iv,
            rate_per_kg_min: rate_min,
            rate_per_kg_max: rate_max,
            unit: "mg".into(),
            max_dose,
            notes: None,
        }
    }

    #[test]
    fn test_sub_unit_dose_keeps_decimals() {
        // 10 kg at 0.01 mg/kg = 0.1 mg, under the 1 mg ceiling
        let result = calculate(10.0, &spec(0.01, 0.01, Some(1.0)));
        assert_eq!(result.formatted, "0.10 mg");
        assert!(!result.capped);
    }

    #[test]
    fn test_ceiling_caps_dose() {
        // 150 kg at 0.01 mg/kg = 1.5 mg, capped to 1 mg
        let result = calculate(150.0, &spec(0.01, 0.01, Some(1.0)));
        assert_eq!(result.formatted, "1 mg");
        assert!(result.capped);
        assert_eq!(result.dose_max, 1.0);
    }

    #[test]
    fn test_precision_tiers() {
        assert_eq!(format_quantity(0.015), "0.015");
        assert_eq!(format_quantity(0.25), "0.25");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(5.0), "5");
        assert_eq!(format_quantity(12.4), "12");
        assert_eq!(format_quantity(12.6), "13");
    }

    #[test]
    fn test_range_dose_formats_both_bounds() {
        // 10 kg at 1-2 mcg/kg
        let mut s = spec(1.0, 2.0, None);
        s.unit = "mcg".into();
        let result = calculate(10.0, &s);
        assert_eq!(result.formatted, "10\u{2013}20 mcg");
        assert_eq!(result.dose_min, 10.0);
        assert_eq!(result.dose_max, 20.0);
    }

    #[test]
    fn test_range_collapses_when_only_max_capped() {
        // 5 mg/kg at 80 kg = 400, capped to 300 on both bounds
        let result = calculate(80.0, &spec(5.0, 5.0, Some(300.0)));
        assert!(result.capped);
        assert_eq!(result.formatted, "300 mg");
    }

    #[test]
    fn test_partial_cap_on_range() {
        // min 100, max 200 against a 150 ceiling
        let result = calculate(10.0, &spec(10.0, 20.0, Some(150.0)));
        assert!(result.capped);
        assert_eq!(result.dose_min, 100.0);
        assert_eq!(result.dose_max, 150.0);
        assert_eq!(result.formatted, "100\u{2013}150 mg");
    }
}
