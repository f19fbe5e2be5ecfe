//! Range parsing and first-match table lookup.
//!
//! Catalog ranges arrive as heterogeneous strings (`"<5"`, `"40+"`,
//! `"10-20"`, `"7"`, `"Infant"`). They are parsed here, once, at
//! catalog-load time into the normalized [`Bound`] variants; downstream
//! code never re-parses strings.

use crate::types::{AgeBucket, Bound, Dimension, SizingEntry};
use crate::{Error, Result};

/// Parse a raw catalog range string into a normalized bound.
///
/// Accepted forms:
/// - `"<5"` → open-low (value strictly below 5)
/// - `"40+"` or `">=40"` → open-high (value at or above 40)
/// - `"10-20"` → bounded, inclusive on both ends
/// - `"7"` → bounded degenerate range `[7, 7]`
/// - `"Infant"` (and the other bucket labels) → category token
///
/// Anything else is a catalog authoring defect and fails fast.
pub fn parse_range(raw: &str) -> Result<Bound> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::MalformedRangeSpec("empty range".into()));
    }

    if let Some(bucket) = AgeBucket::parse_label(s) {
        return Ok(Bound::CategoryToken { bucket });
    }

    if let Some(rest) = s.strip_prefix('<') {
        let max = parse_number(rest, raw)?;
        return Ok(Bound::OpenLow { max });
    }

    if let Some(rest) = s.strip_prefix(">=") {
        let min = parse_number(rest, raw)?;
        return Ok(Bound::OpenHigh { min });
    }

    if let Some(rest) = s.strip_suffix('+') {
        let min = parse_number(rest, raw)?;
        return Ok(Bound::OpenHigh { min });
    }

    // "min-max", tolerating decimals on either side. A leading '-' would
    // be a negative measurement, which no catalog table uses.
    if let Some(idx) = s.find('-') {
        if idx > 0 {
            let min = parse_number(&s[..idx], raw)?;
            let max = parse_number(&s[idx + 1..], raw)?;
            if min > max {
                return Err(Error::MalformedRangeSpec(format!(
                    "inverted range '{}': {} > {}",
                    raw, min, max
                )));
            }
            return Ok(Bound::Bounded { min, max });
        }
    }

    // Bare number: degenerate inclusive range
    let value = parse_number(s, raw)?;
    Ok(Bound::Bounded {
        min: value,
        max: value,
    })
}

fn parse_number(s: &str, raw: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| Error::MalformedRangeSpec(format!("unparseable range '{}'", raw)))
}

/// Does the bound contain a measurement?
///
/// For category tokens the measurement must be an age in months; it is
/// mapped through the system-wide bucket boundaries before comparison.
pub fn contains(bound: &Bound, measurement: f64) -> bool {
    match bound {
        Bound::Bounded { min, max } => measurement >= *min && measurement <= *max,
        Bound::OpenLow { max } => measurement < *max,
        Bound::OpenHigh { min } => measurement >= *min,
        Bound::CategoryToken { bucket } => AgeBucket::from_age_months(measurement) == *bucket,
    }
}

/// Resolve the first entry in table order whose dimension matches and
/// whose bound contains the measurement.
///
/// `None` means "no applicable entry", not an error; callers fall back
/// to the formula registry or report no-match. First-match (not
/// narrowest-match) is deliberate: tables are curated non-overlapping
/// and ordered narrowest-first.
pub fn match_entry<'a>(
    measurement: f64,
    dimension: Dimension,
    entries: &'a [SizingEntry],
) -> Option<&'a SizingEntry> {
    entries
        .iter()
        .filter(|e| e.dimension == dimension)
        .find(|e| contains(&e.bound, measurement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SizeValue;

    fn entry(bound: Bound, dimension: Dimension, label: &str) -> SizingEntry {
        SizingEntry {
            bound,
            dimension,
            value: SizeValue::Text {
                label: label.into(),
            },
            notes: None,
        }
    }

    #[test]
    fn test_parse_open_low() {
        assert_eq!(parse_range("<5").unwrap(), Bound::OpenLow { max: 5.0 });
        assert_eq!(parse_range(" <2.5 ").unwrap(), Bound::OpenLow { max: 2.5 });
    }

    #[test]
    fn test_parse_open_high() {
        assert_eq!(parse_range("40+").unwrap(), Bound::OpenHigh { min: 40.0 });
        assert_eq!(parse_range(">=12").unwrap(), Bound::OpenHigh { min: 12.0 });
    }

    #[test]
    fn test_parse_bounded() {
        assert_eq!(
            parse_range("10-20").unwrap(),
            Bound::Bounded {
                min: 10.0,
                max: 20.0
            }
        );
        assert_eq!(
            parse_range("3.5-4.5").unwrap(),
            Bound::Bounded { min: 3.5, max: 4.5 }
        );
    }

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(
            parse_range("7").unwrap(),
            Bound::Bounded { min: 7.0, max: 7.0 }
        );
    }

    #[test]
    fn test_parse_category_token() {
        assert_eq!(
            parse_range("Infant").unwrap(),
            Bound::CategoryToken {
                bucket: AgeBucket::Infant
            }
        );
        assert_eq!(
            parse_range("school-age").unwrap(),
            Bound::CategoryToken {
                bucket: AgeBucket::SchoolAge
            }
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_range(""),
            Err(Error::MalformedRangeSpec(_))
        ));
        assert!(matches!(
            parse_range("five-ten"),
            Err(Error::MalformedRangeSpec(_))
        ));
        assert!(matches!(
            parse_range("20-10"),
            Err(Error::MalformedRangeSpec(_))
        ));
        assert!(matches!(
            parse_range("<"),
            Err(Error::MalformedRangeSpec(_))
        ));
    }

    #[test]
    fn test_boundary_inclusion() {
        // Bounded: inclusive both ends
        let bounded = Bound::Bounded {
            min: 10.0,
            max: 20.0,
        };
        assert!(contains(&bounded, 10.0));
        assert!(contains(&bounded, 20.0));
        assert!(!contains(&bounded, 20.01));

        // OpenLow: strictly below max
        let low = Bound::OpenLow { max: 5.0 };
        assert!(contains(&low, 4.99));
        assert!(!contains(&low, 5.0));

        // OpenHigh: at or above min
        let high = Bound::OpenHigh { min: 40.0 };
        assert!(contains(&high, 40.0));
        assert!(!contains(&high, 39.99));
    }

    #[test]
    fn test_category_token_uses_bucket_boundaries() {
        let toddler = Bound::CategoryToken {
            bucket: AgeBucket::Toddler,
        };
        assert!(!contains(&toddler, 11.9));
        assert!(contains(&toddler, 12.0));
        assert!(contains(&toddler, 35.9));
        assert!(!contains(&toddler, 36.0));
    }

    #[test]
    fn test_first_match_in_table_order() {
        let table = vec![
            entry(Bound::OpenLow { max: 5.0 }, Dimension::Weight, "small"),
            entry(
                Bound::Bounded {
                    min: 5.0,
                    max: 10.0,
                },
                Dimension::Weight,
                "medium",
            ),
            entry(Bound::OpenHigh { min: 10.0 }, Dimension::Weight, "large"),
        ];

        let hit = match_entry(7.0, Dimension::Weight, &table).unwrap();
        assert_eq!(
            hit.value,
            SizeValue::Text {
                label: "medium".into()
            }
        );

        // 10.0 satisfies both the bounded and open-high entries; the
        // earlier table entry wins.
        let hit = match_entry(10.0, Dimension::Weight, &table).unwrap();
        assert_eq!(
            hit.value,
            SizeValue::Text {
                label: "medium".into()
            }
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let table = vec![entry(
            Bound::Bounded {
                min: 5.0,
                max: 10.0,
            },
            Dimension::Weight,
            "medium",
        )];
        assert!(match_entry(50.0, Dimension::Weight, &table).is_none());
        // Wrong dimension never matches
        assert!(match_entry(7.0, Dimension::Age, &table).is_none());
    }
}
