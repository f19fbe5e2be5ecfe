//! Closed registry of named sizing formulas.
//!
//! Each formula is a pure, total function over its declared input
//! dimension. The registry replaces the original's dynamic formula-string
//! evaluation: formulas are matched exhaustively on [`FormulaId`] and are
//! never built from runtime strings.

use crate::types::{Dimension, FormulaId};
use crate::{Error, Result};

/// Inputs a formula may draw on. Each formula declares which one it
/// requires; invoking it without that input is a contract violation
/// reported as `MissingDimension`, never silently computed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormulaInput {
    pub age_years: Option<f64>,
    pub weight_kg: Option<f64>,
}

/// A computed formula result with its declared display precision
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaOutput {
    pub value: f64,
    pub unit: &'static str,
    /// Decimal places the formula declares for display
    pub decimals: usize,
}

impl FormulaOutput {
    /// Format the value at the declared precision, e.g. "5.0"
    pub fn formatted(&self) -> String {
        format!("{:.*}", self.decimals, self.value)
    }

    /// Format with the unit appended, e.g. "5.0 mm"
    pub fn formatted_with_unit(&self) -> String {
        format!("{} {}", self.formatted(), self.unit)
    }
}

/// Evaluate a registered formula against the available inputs
pub fn evaluate(id: FormulaId, input: &FormulaInput) -> Result<FormulaOutput> {
    match id {
        FormulaId::UncuffedEtt => {
            let age = require_age(id, input)?;
            Ok(FormulaOutput {
                value: age / 4.0 + 4.0,
                unit: "mm",
                decimals: 1,
            })
        }
        FormulaId::CuffedEtt => {
            let age = require_age(id, input)?;
            Ok(FormulaOutput {
                value: age / 4.0 + 3.5,
                unit: "mm",
                decimals: 1,
            })
        }
        FormulaId::SuctionCatheter => {
            // Twice the uncuffed tube size, rounded to a whole French
            let age = require_age(id, input)?;
            Ok(FormulaOutput {
                value: (2.0 * (age / 4.0 + 4.0)).round(),
                unit: "Fr",
                decimals: 0,
            })
        }
        FormulaId::Nasogastric => {
            let age = require_age(id, input)?;
            Ok(FormulaOutput {
                value: (age / 2.0 + 10.0).round(),
                unit: "Fr",
                decimals: 0,
            })
        }
    }
}

fn require_age(formula: FormulaId, input: &FormulaInput) -> Result<f64> {
    input.age_years.ok_or(Error::MissingDimension {
        formula,
        dimension: Dimension::Age,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age(years: f64) -> FormulaInput {
        FormulaInput {
            age_years: Some(years),
            weight_kg: None,
        }
    }

    #[test]
    fn test_uncuffed_ett_at_four_years() {
        let out = evaluate(FormulaId::UncuffedEtt, &age(4.0)).unwrap();
        assert_eq!(out.value, 5.0);
        assert_eq!(out.formatted(), "5.0");
        assert_eq!(out.formatted_with_unit(), "5.0 mm");
    }

    #[test]
    fn test_cuffed_ett_half_size_below_uncuffed() {
        let cuffed = evaluate(FormulaId::CuffedEtt, &age(4.0)).unwrap();
        let uncuffed = evaluate(FormulaId::UncuffedEtt, &age(4.0)).unwrap();
        assert_eq!(uncuffed.value - cuffed.value, 0.5);
    }

    #[test]
    fn test_suction_catheter_is_double_ett_rounded() {
        // Uncuffed at 2y = 4.5 mm; doubled = 9 Fr
        let out = evaluate(FormulaId::SuctionCatheter, &age(2.0)).unwrap();
        assert_eq!(out.value, 9.0);
        assert_eq!(out.formatted(), "9");
    }

    #[test]
    fn test_nasogastric() {
        let out = evaluate(FormulaId::Nasogastric, &age(6.0)).unwrap();
        assert_eq!(out.value, 13.0);
        assert_eq!(out.formatted_with_unit(), "13 Fr");
    }

    #[test]
    fn test_missing_age_is_contract_violation() {
        let input = FormulaInput {
            age_years: None,
            weight_kg: Some(20.0),
        };
        let err = evaluate(FormulaId::UncuffedEtt, &input).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingDimension {
                formula: FormulaId::UncuffedEtt,
                dimension: Dimension::Age,
            }
        ));
    }
}
