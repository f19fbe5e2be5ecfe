//! Bundled reference catalog: medications, equipment, and vital-sign
//! profiles.
//!
//! Catalog records are authored in a JSON-equivalent raw form whose range
//! fields are plain strings; `Catalog::from_raw` parses every range into
//! a normalized `Bound` exactly once at load time. A range that fails to
//! parse is an authoring defect and fails the load fast.

use crate::bounds::parse_range;
use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cached default catalog - parsed once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    // A malformed bundled range is a build-time defect; failing fast at
    // first use is the specified behavior.
    build_default_catalog().expect("bundled catalog contains a malformed range")
});

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Build the default catalog from the bundled raw records
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference.
pub fn build_default_catalog() -> Result<Catalog> {
    Catalog::from_raw(
        builtin_medications(),
        builtin_equipment(),
        builtin_vitals(),
    )
}

// ============================================================================
// Raw (authoring / wire) record types
// ============================================================================

/// One raw size-chart row; `range` is parsed into a `Bound` at load
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawSizingEntry {
    pub range: String,
    pub dimension: Dimension,
    pub value: SizeValue,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Raw equipment record as bundled and as seeded into the store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEquipmentRecord {
    pub id: String,
    pub label: String,
    pub category: String,
    #[serde(default)]
    pub size_chart: Vec<RawSizingEntry>,
    #[serde(default)]
    pub formula: Option<FormulaId>,
}

/// One raw vital band; `range` is parsed into a `Bound` at load
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawVitalEntry {
    pub range: String,
    pub low: f64,
    pub high: f64,
}

/// Raw vital-sign record as bundled and as seeded into the store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawVitalRecord {
    pub id: String,
    pub label: String,
    pub unit: String,
    pub entries: Vec<RawVitalEntry>,
}

impl Catalog {
    /// Parse raw records into the typed catalog, resolving every range
    /// string into a normalized bound
    pub fn from_raw(
        medications: Vec<MedicationRecord>,
        equipment: Vec<RawEquipmentRecord>,
        vitals: Vec<RawVitalRecord>,
    ) -> Result<Self> {
        let medications: HashMap<_, _> = medications
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();

        let mut parsed_equipment = HashMap::new();
        for raw in equipment {
            let mut size_chart = Vec::with_capacity(raw.size_chart.len());
            for row in raw.size_chart {
                size_chart.push(SizingEntry {
                    bound: parse_range(&row.range)?,
                    dimension: row.dimension,
                    value: row.value,
                    notes: row.notes,
                });
            }
            parsed_equipment.insert(
                raw.id.clone(),
                EquipmentRecord {
                    id: raw.id,
                    label: raw.label,
                    category: raw.category,
                    size_chart,
                    formula: raw.formula,
                },
            );
        }

        let mut parsed_vitals = HashMap::new();
        for raw in vitals {
            let mut entries = Vec::with_capacity(raw.entries.len());
            for row in raw.entries {
                entries.push(VitalEntry {
                    bound: parse_range(&row.range)?,
                    low: row.low,
                    high: row.high,
                });
            }
            parsed_vitals.insert(
                raw.id.clone(),
                VitalRecord {
                    id: raw.id,
                    label: raw.label,
                    unit: raw.unit,
                    entries,
                },
            );
        }

        Ok(Catalog {
            medications,
            equipment: parsed_equipment,
            vitals: parsed_vitals,
        })
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, med) in &self.medications {
            if id.is_empty() || med.id.is_empty() {
                errors.push("Medication has empty ID".to_string());
            }
            if id != &med.id {
                errors.push(format!(
                    "Medication key '{}' doesn't match record id '{}'",
                    id, med.id
                ));
            }
            if med.label.is_empty() {
                errors.push(format!("Medication '{}' has empty label", id));
            }
            if med.dosing.is_empty() {
                errors.push(format!("Medication '{}' has no dosing entries", id));
            }
            for spec in &med.dosing {
                if spec.rate_per_kg_min > spec.rate_per_kg_max {
                    errors.push(format!(
                        "Medication '{}' ({}): rate min {} > max {}",
                        id, spec.indication, spec.rate_per_kg_min, spec.rate_per_kg_max
                    ));
                }
                if let Some(ceiling) = spec.max_dose {
                    if ceiling <= 0.0 {
                        errors.push(format!(
                            "Medication '{}' ({}): non-positive max dose {}",
                            id, spec.indication, ceiling
                        ));
                    }
                }
                if spec.unit.is_empty() {
                    errors.push(format!(
                        "Medication '{}' ({}): empty unit",
                        id, spec.indication
                    ));
                }
            }
        }

        for (id, equip) in &self.equipment {
            if id.is_empty() || equip.id.is_empty() {
                errors.push("Equipment has empty ID".to_string());
            }
            if id != &equip.id {
                errors.push(format!(
                    "Equipment key '{}' doesn't match record id '{}'",
                    id, equip.id
                ));
            }
            if equip.size_chart.is_empty() && equip.formula.is_none() {
                errors.push(format!(
                    "Equipment '{}' has neither a size chart nor a formula",
                    id
                ));
            }
            for entry in &equip.size_chart {
                // Category tokens only make sense over the age dimension
                if matches!(entry.bound, Bound::CategoryToken { .. })
                    && entry.dimension != Dimension::Age
                {
                    errors.push(format!(
                        "Equipment '{}': category token on non-age dimension",
                        id
                    ));
                }
            }
        }

        for (id, vital) in &self.vitals {
            if id.is_empty() || vital.id.is_empty() {
                errors.push("Vital record has empty ID".to_string());
            }
            if vital.entries.is_empty() {
                errors.push(format!("Vital '{}' has no bands", id));
            }
            for entry in &vital.entries {
                if entry.low > entry.high {
                    errors.push(format!(
                        "Vital '{}': band low {} > high {}",
                        id, entry.low, entry.high
                    ));
                }
            }
        }

        errors
    }
}

/// Serialize the bundled defaults for a reference collection into store
/// records, ready for seeding
pub fn builtin_records(collection: Collection) -> Vec<StoredRecord> {
    match collection {
        Collection::Medications => builtin_medications()
            .iter()
            .filter_map(|m| to_record(&m.id, m))
            .collect(),
        Collection::Equipment => builtin_equipment()
            .iter()
            .filter_map(|e| to_record(&e.id, e))
            .collect(),
        Collection::VitalSigns => builtin_vitals()
            .iter()
            .filter_map(|v| to_record(&v.id, v))
            .collect(),
        _ => Vec::new(),
    }
}

fn to_record<T: Serialize>(id: &str, payload: &T) -> Option<StoredRecord> {
    match StoredRecord::from_serialize(id, payload) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Failed to serialize bundled record '{}': {}", id, e);
            None
        }
    }
}

// ============================================================================
// Bundled default data
// ============================================================================

fn dose(
    indication: &str,
    route: Route,
    rate_min: f64,
    rate_max: f64,
    unit: &str,
    max_dose: Option<f64>,
    notes: Option<&str>,
) -> DoseSpec {
    DoseSpec {
        indication: indication.into(),
        route,
        rate_per_kg_min: rate_min,
        rate_per_kg_max: rate_max,
        unit: unit.into(),
        max_dose,
        notes: notes.map(Into::into),
    }
}

/// Bundled medication dosing specs (PALS-aligned reference values)
pub fn builtin_medications() -> Vec<MedicationRecord> {
    vec![
        MedicationRecord {
            id: "epinephrine".into(),
            label: "Epinephrine".into(),
            category: "resuscitation".into(),
            dosing: vec![
                dose(
                    "Cardiac arrest",
                    Route::Iv,
                    0.01,
                    0.01,
                    "mg",
                    Some(1.0),
                    Some("0.1 mL/kg of 0.1 mg/mL; repeat every 3-5 min"),
                ),
                dose(
                    "Anaphylaxis",
                    Route::Im,
                    0.01,
                    0.01,
                    "mg",
                    Some(0.5),
                    None,
                ),
            ],
        },
        MedicationRecord {
            id: "amiodarone".into(),
            label: "Amiodarone".into(),
            category: "resuscitation".into(),
            dosing: vec![dose(
                "VF / pulseless VT",
                Route::Io,
                5.0,
                5.0,
                "mg",
                Some(300.0),
                Some("May repeat up to twice"),
            )],
        },
        MedicationRecord {
            id: "adenosine".into(),
            label: "Adenosine".into(),
            category: "cardiac".into(),
            dosing: vec![
                dose("SVT, first dose", Route::Iv, 0.1, 0.1, "mg", Some(6.0), None),
                dose(
                    "SVT, second dose",
                    Route::Iv,
                    0.2,
                    0.2,
                    "mg",
                    Some(12.0),
                    None,
                ),
            ],
        },
        MedicationRecord {
            id: "atropine".into(),
            label: "Atropine".into(),
            category: "resuscitation".into(),
            dosing: vec![dose(
                "Bradycardia",
                Route::Iv,
                0.02,
                0.02,
                "mg",
                Some(0.5),
                Some("Minimum single dose 0.1 mg"),
            )],
        },
        MedicationRecord {
            id: "midazolam".into(),
            label: "Midazolam".into(),
            category: "seizure".into(),
            dosing: vec![dose(
                "Status epilepticus",
                Route::Iv,
                0.1,
                0.2,
                "mg",
                Some(10.0),
                None,
            )],
        },
        MedicationRecord {
            id: "dextrose".into(),
            label: "Dextrose 10%".into(),
            category: "metabolic".into(),
            dosing: vec![dose(
                "Hypoglycemia",
                Route::Iv,
                5.0,
                10.0,
                "mL",
                None,
                Some("D10W"),
            )],
        },
        MedicationRecord {
            id: "fentanyl".into(),
            label: "Fentanyl".into(),
            category: "analgesia".into(),
            dosing: vec![dose(
                "Pain",
                Route::Intranasal,
                1.0,
                2.0,
                "mcg",
                Some(100.0),
                None,
            )],
        },
        MedicationRecord {
            id: "naloxone".into(),
            label: "Naloxone".into(),
            category: "reversal".into(),
            dosing: vec![dose(
                "Opioid reversal",
                Route::Iv,
                0.1,
                0.1,
                "mg",
                Some(2.0),
                None,
            )],
        },
    ]
}

fn chart_row(range: &str, dimension: Dimension, value: SizeValue) -> RawSizingEntry {
    RawSizingEntry {
        range: range.into(),
        dimension,
        value,
        notes: None,
    }
}

fn numeric(value: f64, unit: &str) -> SizeValue {
    SizeValue::Numeric {
        value,
        unit: unit.into(),
    }
}

fn text(label: &str) -> SizeValue {
    SizeValue::Text {
        label: label.into(),
    }
}

/// Bundled equipment size charts and formula references
pub fn builtin_equipment() -> Vec<RawEquipmentRecord> {
    vec![
        RawEquipmentRecord {
            id: "ett-uncuffed".into(),
            label: "Endotracheal tube (uncuffed)".into(),
            category: "airway".into(),
            // Age in months for the first year; the formula covers
            // everything older
            size_chart: vec![
                chart_row("<6", Dimension::Age, numeric(3.5, "mm")),
                chart_row("6-12", Dimension::Age, numeric(4.0, "mm")),
            ],
            formula: Some(FormulaId::UncuffedEtt),
        },
        RawEquipmentRecord {
            id: "ett-cuffed".into(),
            label: "Endotracheal tube (cuffed)".into(),
            category: "airway".into(),
            size_chart: vec![chart_row("<12", Dimension::Age, numeric(3.0, "mm"))],
            formula: Some(FormulaId::CuffedEtt),
        },
        RawEquipmentRecord {
            id: "suction-catheter".into(),
            label: "Suction catheter".into(),
            category: "airway".into(),
            size_chart: vec![],
            formula: Some(FormulaId::SuctionCatheter),
        },
        RawEquipmentRecord {
            id: "ng-tube".into(),
            label: "Nasogastric tube".into(),
            category: "gastric".into(),
            size_chart: vec![chart_row("<12", Dimension::Age, numeric(8.0, "Fr"))],
            formula: Some(FormulaId::Nasogastric),
        },
        RawEquipmentRecord {
            id: "laryngoscope-blade".into(),
            label: "Laryngoscope blade".into(),
            category: "airway".into(),
            size_chart: vec![
                chart_row("<5", Dimension::Weight, text("Miller 0")),
                chart_row("5-10", Dimension::Weight, text("Miller 1")),
                chart_row("10-30", Dimension::Weight, text("Mac 2")),
                chart_row("30+", Dimension::Weight, text("Mac 3")),
            ],
            formula: None,
        },
        RawEquipmentRecord {
            id: "bag-mask".into(),
            label: "Bag-valve mask".into(),
            category: "breathing".into(),
            size_chart: vec![
                chart_row("Infant", Dimension::Age, text("Infant mask")),
                chart_row("Toddler", Dimension::Age, text("Child mask")),
                chart_row("Preschool", Dimension::Age, text("Child mask")),
                chart_row("School-age", Dimension::Age, text("Small adult mask")),
                chart_row("Adolescent", Dimension::Age, text("Adult mask")),
            ],
            formula: None,
        },
        RawEquipmentRecord {
            id: "iv-catheter".into(),
            label: "IV catheter".into(),
            category: "circulation".into(),
            size_chart: vec![
                chart_row("<10", Dimension::Weight, numeric(24.0, "G")),
                chart_row("10-20", Dimension::Weight, numeric(22.0, "G")),
                chart_row("20-40", Dimension::Weight, numeric(20.0, "G")),
                chart_row("40+", Dimension::Weight, numeric(18.0, "G")),
            ],
            formula: None,
        },
        RawEquipmentRecord {
            id: "defib-pads".into(),
            label: "Defibrillator pads".into(),
            category: "circulation".into(),
            size_chart: vec![
                chart_row("<10", Dimension::Weight, text("Infant pads")),
                chart_row("10+", Dimension::Weight, text("Adult pads")),
            ],
            formula: None,
        },
    ]
}

fn vital_band(range: &str, low: f64, high: f64) -> RawVitalEntry {
    RawVitalEntry {
        range: range.into(),
        low,
        high,
    }
}

/// Bundled vital-sign profiles.
///
/// Bands are authored as age-bucket tokens so the thresholds and the
/// bucket boundaries used elsewhere can never disagree.
pub fn builtin_vitals() -> Vec<RawVitalRecord> {
    vec![
        RawVitalRecord {
            id: "heart-rate".into(),
            label: "Heart rate".into(),
            unit: "bpm".into(),
            entries: vec![
                vital_band("Infant", 100.0, 160.0),
                vital_band("Toddler", 90.0, 150.0),
                vital_band("Preschool", 80.0, 140.0),
                vital_band("School-age", 70.0, 120.0),
                vital_band("Adolescent", 60.0, 100.0),
            ],
        },
        RawVitalRecord {
            id: "respiratory-rate".into(),
            label: "Respiratory rate".into(),
            unit: "breaths/min".into(),
            entries: vec![
                vital_band("Infant", 30.0, 60.0),
                vital_band("Toddler", 24.0, 40.0),
                vital_band("Preschool", 22.0, 34.0),
                vital_band("School-age", 18.0, 30.0),
                vital_band("Adolescent", 12.0, 16.0),
            ],
        },
        RawVitalRecord {
            id: "systolic-bp".into(),
            label: "Systolic blood pressure".into(),
            unit: "mmHg".into(),
            entries: vec![
                vital_band("Infant", 70.0, 100.0),
                vital_band("Toddler", 80.0, 110.0),
                vital_band("Preschool", 85.0, 110.0),
                vital_band("School-age", 90.0, 120.0),
                vital_band("Adolescent", 100.0, 130.0),
            ],
        },
    ]
}
