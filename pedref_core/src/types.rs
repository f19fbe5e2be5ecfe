//! Core domain types for the pediatric reference engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Normalized range bounds and age buckets
//! - Sizing and dosing specifications
//! - The patient profile and resolution result types
//! - Persisted record and collection naming

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Measurement Dimensions and Age Buckets
// ============================================================================

/// The dimension a table entry or measurement is keyed on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Weight in kilograms
    Weight,
    /// Age in months
    Age,
    /// Length (height) in centimetres
    Length,
}

/// Pediatric age bucket, the single source of bucket boundaries system-wide.
///
/// Category-token ranges ("Infant", "Toddler", ...) and any age-bucketed
/// vital table must agree on where each bucket starts, so all of them
/// map through `from_age_months`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    Infant,
    Toddler,
    Preschool,
    SchoolAge,
    Adolescent,
}

impl AgeBucket {
    /// Map an age in months to its bucket
    pub fn from_age_months(age_months: f64) -> Self {
        if age_months < 12.0 {
            AgeBucket::Infant
        } else if age_months < 36.0 {
            AgeBucket::Toddler
        } else if age_months < 60.0 {
            AgeBucket::Preschool
        } else if age_months < 144.0 {
            AgeBucket::SchoolAge
        } else {
            AgeBucket::Adolescent
        }
    }

    /// Human label as it appears in catalog range strings
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Infant => "Infant",
            AgeBucket::Toddler => "Toddler",
            AgeBucket::Preschool => "Preschool",
            AgeBucket::SchoolAge => "School-age",
            AgeBucket::Adolescent => "Adolescent",
        }
    }

    /// Parse a catalog range token into a bucket (case-insensitive)
    pub fn parse_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "infant" => Some(AgeBucket::Infant),
            "toddler" => Some(AgeBucket::Toddler),
            "preschool" => Some(AgeBucket::Preschool),
            "school-age" | "school age" | "schoolage" => Some(AgeBucket::SchoolAge),
            "adolescent" => Some(AgeBucket::Adolescent),
            _ => None,
        }
    }
}

// ============================================================================
// Bounds (normalized range representation)
// ============================================================================

/// Normalized range bound, parsed exactly once at catalog-load time.
///
/// Boundary semantics: `Bounded` is inclusive on both ends, `OpenLow`
/// is strictly `< max`, `OpenHigh` is `>= min`. `CategoryToken` matches
/// a derived age bucket rather than a raw number.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bound {
    Bounded { min: f64, max: f64 },
    OpenLow { max: f64 },
    OpenHigh { min: f64 },
    CategoryToken { bucket: AgeBucket },
}

// ============================================================================
// Sizing Types
// ============================================================================

/// The value a sizing entry resolves to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizeValue {
    /// A numeric size with a unit (e.g., 3.5 mm)
    Numeric { value: f64, unit: String },
    /// A named size with no numeric interpretation (e.g., "Miller 1")
    Text { label: String },
}

impl SizeValue {
    /// Render the size for display
    pub fn display(&self) -> String {
        match self {
            SizeValue::Numeric { value, unit } => {
                if value.fract().abs() < f64::EPSILON {
                    format!("{} {}", *value as i64, unit)
                } else {
                    format!("{:.1} {}", value, unit)
                }
            }
            SizeValue::Text { label } => label.clone(),
        }
    }
}

/// One row of a sizing table: a bound over one dimension mapping to a size
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SizingEntry {
    pub bound: Bound,
    pub dimension: Dimension,
    pub value: SizeValue,
    pub notes: Option<String>,
}

// ============================================================================
// Dosing Types
// ============================================================================

/// Administration route for a dose specification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Iv,
    Io,
    Im,
    Oral,
    Intranasal,
    Nebulized,
    Ett,
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::Iv => "IV",
            Route::Io => "IO",
            Route::Im => "IM",
            Route::Oral => "PO",
            Route::Intranasal => "IN",
            Route::Nebulized => "NEB",
            Route::Ett => "ETT",
        }
    }
}

/// Per-kilogram dosing specification for one indication/route.
///
/// Invariant: `rate_per_kg_min <= rate_per_kg_max`. `max_dose`, when
/// present, is a hard ceiling applied after weight multiplication.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoseSpec {
    pub indication: String,
    pub route: Route,
    pub rate_per_kg_min: f64,
    pub rate_per_kg_max: f64,
    pub unit: String,
    pub max_dose: Option<f64>,
    pub notes: Option<String>,
}

/// A resolved, formatted dose
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseResult {
    pub indication: String,
    pub route: Route,
    /// Display string, e.g. "0.15 mg" or "1–2 mcg"
    pub formatted: String,
    /// Low end of the computed dose (after capping)
    pub dose_min: f64,
    /// High end of the computed dose (after capping)
    pub dose_max: f64,
    pub unit: String,
    /// True when `max_dose` clamped the computed value
    pub capped: bool,
    /// The weight the dose was computed against
    pub weight_kg: f64,
    /// True when the weight came from the estimator, not the profile
    pub weight_estimated: bool,
    pub notes: Option<String>,
}

// ============================================================================
// Formula Types
// ============================================================================

/// Closed registry of named pure formulas.
///
/// Formulas are never constructed from runtime strings; the catalog
/// references them by these serialized names only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FormulaId {
    UncuffedEtt,
    CuffedEtt,
    SuctionCatheter,
    Nasogastric,
}

// ============================================================================
// Patient Profile
// ============================================================================

/// The patient's known measurements. All optional, but at least one must
/// be present for any resolution to succeed.
///
/// Mutated only by explicit user edit or full reset; an estimated weight
/// is never written back into the stored profile.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct PatientProfile {
    pub weight_kg: Option<f64>,
    pub age_months: Option<f64>,
    pub length_cm: Option<f64>,
}

impl PatientProfile {
    /// True when no measurement is present
    pub fn is_empty(&self) -> bool {
        self.weight_kg.is_none() && self.age_months.is_none() && self.length_cm.is_none()
    }

    /// Age converted to years, when known
    pub fn age_years(&self) -> Option<f64> {
        self.age_months.map(|m| m / 12.0)
    }

    /// The profile's measurement along a given dimension, when known
    pub fn measurement(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Weight => self.weight_kg,
            Dimension::Age => self.age_months,
            Dimension::Length => self.length_cm,
        }
    }
}

// ============================================================================
// Resolution Results
// ============================================================================

/// Tagged outcome of a resolution call.
///
/// Data states are returned, never thrown: the presentation layer renders
/// "add patient info" or "no match" without exception handling.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    /// A value was resolved
    Resolved(T),
    /// No usable dimension was present for this target
    InsufficientPatientData,
    /// A dimension was present but no table entry contained it and no
    /// formula fallback exists
    NoMatchingRange,
}

impl<T> Resolution<T> {
    /// Get the resolved value, if any
    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Where a resolved equipment size came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SizeSource {
    /// Matched against the equipment's size chart
    Chart,
    /// Computed by a registered formula
    Formula(FormulaId),
}

/// A resolved equipment size
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SizeResult {
    /// Display string, e.g. "5.0 mm" or "Miller 1"
    pub formatted: String,
    pub source: SizeSource,
    /// True when the match used an estimated weight
    pub weight_estimated: bool,
    pub notes: Option<String>,
}

/// A resolved vital-sign reference range
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VitalRangeResult {
    /// Label of the matched band (usually the age bucket)
    pub label: String,
    pub low: f64,
    pub high: f64,
    pub unit: String,
}

// ============================================================================
// Catalog Record Types (parsed)
// ============================================================================

/// A medication with its per-kg dosing entries
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub id: String,
    pub label: String,
    pub category: String,
    pub dosing: Vec<DoseSpec>,
}

/// A piece of equipment with a size chart and/or a formula reference
#[derive(Clone, Debug)]
pub struct EquipmentRecord {
    pub id: String,
    pub label: String,
    pub category: String,
    pub size_chart: Vec<SizingEntry>,
    pub formula: Option<FormulaId>,
}

/// One band of a vital-sign profile
#[derive(Clone, Debug)]
pub struct VitalEntry {
    pub bound: Bound,
    pub low: f64,
    pub high: f64,
}

/// A vital-sign profile banded by age
#[derive(Clone, Debug)]
pub struct VitalRecord {
    pub id: String,
    pub label: String,
    pub unit: String,
    pub entries: Vec<VitalEntry>,
}

/// The complete parsed reference catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    pub medications: HashMap<String, MedicationRecord>,
    pub equipment: HashMap<String, EquipmentRecord>,
    pub vitals: HashMap<String, VitalRecord>,
}

// ============================================================================
// Persisted Record Types
// ============================================================================

/// Named collection in the persistent store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    // Reference collections, seeded once from the bundled catalog
    Medications,
    Equipment,
    VitalSigns,
    // User collections, never seeded
    Contacts,
    Checklists,
    PatientProfile,
    Preferences,
}

impl Collection {
    /// Stable on-disk name of the collection
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Medications => "medications",
            Collection::Equipment => "equipment",
            Collection::VitalSigns => "vital_signs",
            Collection::Contacts => "contacts",
            Collection::Checklists => "checklists",
            Collection::PatientProfile => "patient_profile",
            Collection::Preferences => "preferences",
        }
    }

    /// True for collections owned by the bundled catalog
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Collection::Medications | Collection::Equipment | Collection::VitalSigns
        )
    }
}

/// A record as persisted in the store, keyed by a stable id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub payload: serde_json::Value,
}

impl StoredRecord {
    /// Build a record from any serializable payload
    pub fn from_serialize<T: Serialize>(id: impl Into<String>, payload: &T) -> crate::Result<Self> {
        Ok(Self {
            id: id.into(),
            payload: serde_json::to_value(payload)?,
        })
    }
}
