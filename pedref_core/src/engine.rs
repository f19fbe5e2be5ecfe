//! Resolution engine: the single façade combining catalog, matcher,
//! formulas, estimator, dose calculator, and store.
//!
//! All presentation code resolves through this service; no screen
//! recomputes matching logic locally. Construction seeds the reference
//! collections, then loads the catalog from the store, falling back to
//! the bundled in-memory defaults whenever the store is unavailable,
//! unseeded, or unreadable.

use crate::bounds::{contains, match_entry};
use crate::catalog::{
    builtin_records, get_default_catalog, RawEquipmentRecord, RawVitalRecord,
};
use crate::estimator::{self, EstimationMethod};
use crate::formulas::{self, FormulaInput};
use crate::seeder::seed_if_empty;
use crate::store::FileStore;
use crate::types::*;
use crate::{dose, Error, Result};
use serde::de::DeserializeOwned;

pub struct ResolutionEngine {
    catalog: Catalog,
    store: FileStore,
    method: EstimationMethod,
}

impl ResolutionEngine {
    /// Seed reference collections and load the catalog
    pub fn new(store: FileStore) -> Self {
        Self::with_method(store, EstimationMethod::Standard)
    }

    /// Like `new`, with an explicit weight-estimation method
    pub fn with_method(store: FileStore, method: EstimationMethod) -> Self {
        // Seeding completes before any read is treated as authoritative
        for collection in [
            Collection::Medications,
            Collection::Equipment,
            Collection::VitalSigns,
        ] {
            seed_if_empty(&store, collection, &builtin_records(collection));
        }

        let catalog = load_catalog(&store);
        Self {
            catalog,
            store,
            method,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn estimation_method(&self) -> EstimationMethod {
        self.method
    }

    /// Estimate the patient's weight without persisting it
    pub fn estimate_weight(&self, profile: &PatientProfile) -> Option<f64> {
        estimator::estimate(profile, self.method)
    }

    /// Resolve a medication dose for the profile.
    ///
    /// `indication` selects among a medication's dosing entries; with
    /// none, the first authored entry is used. Weight is taken from the
    /// profile or backfilled by the estimator; without either the result
    /// is `InsufficientPatientData`.
    pub fn resolve_dose(
        &self,
        profile: &PatientProfile,
        medication_id: &str,
        indication: Option<&str>,
    ) -> Result<Resolution<DoseResult>> {
        let med = self
            .catalog
            .medications
            .get(medication_id)
            .ok_or_else(|| Error::UnknownRecord {
                collection: "medications".into(),
                id: medication_id.into(),
            })?;

        let spec = match indication {
            Some(wanted) => med
                .dosing
                .iter()
                .find(|d| d.indication.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| Error::UnknownRecord {
                    collection: format!("{} dosing", medication_id),
                    id: wanted.into(),
                })?,
            None => med.dosing.first().ok_or_else(|| {
                Error::CatalogValidation(format!("medication '{}' has no dosing", medication_id))
            })?,
        };

        let (weight, estimated) = match profile.weight_kg {
            Some(w) => (w, false),
            None => match self.estimate_weight(profile) {
                Some(w) => (w, true),
                None => return Ok(Resolution::InsufficientPatientData),
            },
        };

        let mut result = dose::calculate(weight, spec);
        result.weight_estimated = estimated;
        tracing::debug!(
            "Resolved dose for '{}' ({}) at {} kg: {}",
            medication_id,
            result.indication,
            weight,
            result.formatted
        );
        Ok(Resolution::Resolved(result))
    }

    /// Resolve an equipment size for the profile.
    ///
    /// Order: available dimensions weight, age, length against the size
    /// chart; then estimator-backfilled weight, retried once; then the
    /// equipment's registered formula; else `NoMatchingRange` when a
    /// usable dimension was present and `InsufficientPatientData` when
    /// none was.
    pub fn resolve_equipment_size(
        &self,
        profile: &PatientProfile,
        equipment_id: &str,
    ) -> Result<Resolution<SizeResult>> {
        let equip = self
            .catalog
            .equipment
            .get(equipment_id)
            .ok_or_else(|| Error::UnknownRecord {
                collection: "equipment".into(),
                id: equipment_id.into(),
            })?;

        let chart_has = |dimension: Dimension| {
            equip.size_chart.iter().any(|e| e.dimension == dimension)
        };
        let mut had_dimension = false;

        for dimension in [Dimension::Weight, Dimension::Age, Dimension::Length] {
            if let Some(measurement) = profile.measurement(dimension) {
                if chart_has(dimension) {
                    had_dimension = true;
                }
                if let Some(entry) = match_entry(measurement, dimension, &equip.size_chart) {
                    return Ok(Resolution::Resolved(SizeResult {
                        formatted: entry.value.display(),
                        source: SizeSource::Chart,
                        weight_estimated: false,
                        notes: entry.notes.clone(),
                    }));
                }
            }
        }

        // Backfill weight from age/length and retry the chart once
        if profile.weight_kg.is_none() && chart_has(Dimension::Weight) {
            if let Some(weight) = self.estimate_weight(profile) {
                had_dimension = true;
                if let Some(entry) = match_entry(weight, Dimension::Weight, &equip.size_chart) {
                    return Ok(Resolution::Resolved(SizeResult {
                        formatted: entry.value.display(),
                        source: SizeSource::Chart,
                        weight_estimated: true,
                        notes: entry.notes.clone(),
                    }));
                }
            }
        }

        if let Some(formula) = equip.formula {
            let input = FormulaInput {
                age_years: profile.age_years(),
                weight_kg: profile.weight_kg,
            };
            match formulas::evaluate(formula, &input) {
                Ok(output) => {
                    return Ok(Resolution::Resolved(SizeResult {
                        formatted: output.formatted_with_unit(),
                        source: SizeSource::Formula(formula),
                        weight_estimated: false,
                        notes: None,
                    }));
                }
                // The formula's input dimension is absent; that is a
                // data state here, not a caller bug
                Err(Error::MissingDimension { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if had_dimension {
            Ok(Resolution::NoMatchingRange)
        } else {
            Ok(Resolution::InsufficientPatientData)
        }
    }

    /// Resolve a vital-sign reference range for the profile's age
    pub fn resolve_vital_range(
        &self,
        profile: &PatientProfile,
        vital_id: &str,
    ) -> Result<Resolution<VitalRangeResult>> {
        let vital = self
            .catalog
            .vitals
            .get(vital_id)
            .ok_or_else(|| Error::UnknownRecord {
                collection: "vital_signs".into(),
                id: vital_id.into(),
            })?;

        let Some(age_months) = profile.age_months else {
            return Ok(Resolution::InsufficientPatientData);
        };

        for entry in &vital.entries {
            if contains(&entry.bound, age_months) {
                let label = match entry.bound {
                    Bound::CategoryToken { bucket } => bucket.label(),
                    _ => AgeBucket::from_age_months(age_months).label(),
                };
                return Ok(Resolution::Resolved(VitalRangeResult {
                    label: label.into(),
                    low: entry.low,
                    high: entry.high,
                    unit: vital.unit.clone(),
                }));
            }
        }

        // Bundled tables are total over age; a gap can only come from
        // user-authored bands
        Ok(Resolution::NoMatchingRange)
    }
}

/// Load the catalog from the store, falling back to the bundled defaults
/// when the store is unavailable, unseeded, or unreadable
fn load_catalog(store: &FileStore) -> Catalog {
    if !store.is_available() {
        tracing::info!("Store unavailable; using bundled catalog");
        return get_default_catalog().clone();
    }

    let medications: Vec<MedicationRecord> = read_typed(store, Collection::Medications);
    let equipment: Vec<RawEquipmentRecord> = read_typed(store, Collection::Equipment);
    let vitals: Vec<RawVitalRecord> = read_typed(store, Collection::VitalSigns);

    if medications.is_empty() || equipment.is_empty() || vitals.is_empty() {
        tracing::info!("Reference collections empty or unreadable; using bundled catalog");
        return get_default_catalog().clone();
    }

    match Catalog::from_raw(medications, equipment, vitals) {
        Ok(catalog) => {
            let errors = catalog.validate();
            if errors.is_empty() {
                catalog
            } else {
                tracing::warn!(
                    "Stored catalog failed validation ({} errors); using bundled catalog",
                    errors.len()
                );
                get_default_catalog().clone()
            }
        }
        Err(e) => {
            tracing::warn!("Stored catalog unparseable: {}; using bundled catalog", e);
            get_default_catalog().clone()
        }
    }
}

fn read_typed<T: DeserializeOwned>(store: &FileStore, collection: Collection) -> Vec<T> {
    store
        .get_all(collection)
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable record '{}' in '{}': {}",
                    record.id,
                    collection.as_str(),
                    e
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawSizingEntry;
    use crate::types::StoredRecord;

    fn open_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data"));
        (dir, store)
    }

    fn unavailable_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file").unwrap();
        (dir, FileStore::open(blocker))
    }

    fn weight_profile(kg: f64) -> PatientProfile {
        PatientProfile {
            weight_kg: Some(kg),
            ..Default::default()
        }
    }

    fn age_profile(months: f64) -> PatientProfile {
        PatientProfile {
            age_months: Some(months),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_seeds_reference_collections() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);
        assert!(!engine.store().get_all(Collection::Medications).is_empty());
        assert!(!engine.store().get_all(Collection::Equipment).is_empty());
        assert!(!engine.store().get_all(Collection::VitalSigns).is_empty());
        // User collections stay empty
        assert!(engine.store().get_all(Collection::Contacts).is_empty());
    }

    #[test]
    fn test_resolve_dose_with_known_weight() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let result = engine
            .resolve_dose(&weight_profile(10.0), "epinephrine", None)
            .unwrap()
            .resolved()
            .unwrap();

        assert_eq!(result.formatted, "0.10 mg");
        assert!(!result.capped);
        assert!(!result.weight_estimated);
    }

    #[test]
    fn test_resolve_dose_backfills_weight_from_age() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        // 4 years -> 16 kg standard; amiodarone 5 mg/kg = 80 mg
        let result = engine
            .resolve_dose(&age_profile(48.0), "amiodarone", None)
            .unwrap()
            .resolved()
            .unwrap();

        assert_eq!(result.formatted, "80 mg");
        assert!(result.weight_estimated);
        assert_eq!(result.weight_kg, 16.0);
    }

    #[test]
    fn test_resolve_dose_indication_selector() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);
        let profile = weight_profile(20.0);

        let first = engine
            .resolve_dose(&profile, "adenosine", Some("SVT, first dose"))
            .unwrap()
            .resolved()
            .unwrap();
        let second = engine
            .resolve_dose(&profile, "adenosine", Some("SVT, second dose"))
            .unwrap()
            .resolved()
            .unwrap();

        assert_eq!(first.formatted, "2 mg");
        assert_eq!(second.formatted, "4 mg");
    }

    #[test]
    fn test_resolve_dose_empty_profile() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let outcome = engine
            .resolve_dose(&PatientProfile::default(), "epinephrine", None)
            .unwrap();
        assert_eq!(outcome, Resolution::InsufficientPatientData);
    }

    #[test]
    fn test_unknown_medication_is_an_error() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let err = engine
            .resolve_dose(&weight_profile(10.0), "no-such-drug", None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRecord { .. }));
    }

    #[test]
    fn test_equipment_chart_match_by_weight() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let result = engine
            .resolve_equipment_size(&weight_profile(7.0), "laryngoscope-blade")
            .unwrap()
            .resolved()
            .unwrap();
        assert_eq!(result.formatted, "Miller 1");
        assert_eq!(result.source, SizeSource::Chart);
    }

    #[test]
    fn test_equipment_category_token_match() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let result = engine
            .resolve_equipment_size(&age_profile(20.0), "bag-mask")
            .unwrap()
            .resolved()
            .unwrap();
        assert_eq!(result.formatted, "Child mask");
    }

    #[test]
    fn test_equipment_formula_fallback() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        // 4 years is past the chart rows, so the formula applies
        let result = engine
            .resolve_equipment_size(&age_profile(48.0), "ett-uncuffed")
            .unwrap()
            .resolved()
            .unwrap();
        assert_eq!(result.formatted, "5.0 mm");
        assert_eq!(
            result.source,
            SizeSource::Formula(FormulaId::UncuffedEtt)
        );
    }

    #[test]
    fn test_equipment_estimated_weight_retry() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        // Length-only profile: 80 cm -> 13 kg estimate -> 22 G catheter
        let profile = PatientProfile {
            length_cm: Some(80.0),
            ..Default::default()
        };
        let result = engine
            .resolve_equipment_size(&profile, "iv-catheter")
            .unwrap()
            .resolved()
            .unwrap();
        assert_eq!(result.formatted, "22 G");
        assert!(result.weight_estimated);
    }

    #[test]
    fn test_equipment_insufficient_data() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let outcome = engine
            .resolve_equipment_size(&PatientProfile::default(), "iv-catheter")
            .unwrap();
        assert_eq!(outcome, Resolution::InsufficientPatientData);
    }

    #[test]
    fn test_no_matching_range_from_store_authored_chart() {
        let (_dir, store) = open_store();

        // Author an equipment record whose chart has a gap and no formula
        let custom = RawEquipmentRecord {
            id: "custom-splint".into(),
            label: "Custom splint".into(),
            category: "trauma".into(),
            size_chart: vec![RawSizingEntry {
                range: "5-10".into(),
                dimension: Dimension::Weight,
                value: SizeValue::Text {
                    label: "small".into(),
                },
                notes: None,
            }],
            formula: None,
        };
        // Seed defaults first, then add the custom record
        let engine = ResolutionEngine::new(store);
        let record = StoredRecord::from_serialize("custom-splint", &custom).unwrap();
        engine.store().put(Collection::Equipment, record);

        // Re-open over the same data so the catalog reloads
        let root = engine.store().get_all(Collection::Equipment);
        assert!(root.iter().any(|r| r.id == "custom-splint"));
        let engine = ResolutionEngine::new(FileStore::open(
            _dir.path().join("data"),
        ));

        let outcome = engine
            .resolve_equipment_size(&weight_profile(50.0), "custom-splint")
            .unwrap();
        assert_eq!(outcome, Resolution::NoMatchingRange);
    }

    #[test]
    fn test_resolve_vital_range() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let result = engine
            .resolve_vital_range(&age_profile(6.0), "heart-rate")
            .unwrap()
            .resolved()
            .unwrap();
        assert_eq!(result.label, "Infant");
        assert_eq!(result.low, 100.0);
        assert_eq!(result.high, 160.0);
        assert_eq!(result.unit, "bpm");
    }

    #[test]
    fn test_vital_range_requires_age() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let outcome = engine
            .resolve_vital_range(&weight_profile(20.0), "heart-rate")
            .unwrap();
        assert_eq!(outcome, Resolution::InsufficientPatientData);
    }

    #[test]
    fn test_offline_fallback_to_bundled_catalog() {
        let (_dir, store) = unavailable_store();
        let engine = ResolutionEngine::new(store);
        assert!(!engine.store().is_available());

        // Resolution still works from the bundled catalog
        let dose = engine
            .resolve_dose(&weight_profile(10.0), "epinephrine", None)
            .unwrap();
        assert!(dose.is_resolved());

        let size = engine
            .resolve_equipment_size(&weight_profile(7.0), "laryngoscope-blade")
            .unwrap();
        assert!(size.is_resolved());
    }

    #[test]
    fn test_estimate_never_mutates_profile() {
        let (_dir, store) = open_store();
        let engine = ResolutionEngine::new(store);

        let profile = age_profile(24.0);
        let snapshot = profile.clone();
        let estimate = engine.estimate_weight(&profile);
        assert!(estimate.is_some());
        assert_eq!(profile, snapshot);
        assert!(profile.weight_kg.is_none());
    }
}
