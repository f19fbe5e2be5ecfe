//! Integration tests for the pedref binary.
//!
//! These tests verify end-to-end behavior including:
//! - Dose, size, and vital resolution through the CLI
//! - Profile persistence and reset
//! - Idempotent seeding of reference collections
//! - Contact and checklist storage

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pedref"))
}

fn record_count(data_dir: &Path, collection: &str) -> usize {
    let contents = std::fs::read_to_string(data_dir.join(format!("{}.json", collection)))
        .expect("collection file should exist");
    let records: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
    records.len()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pediatric emergency reference tool"));
}

#[test]
fn test_dose_with_weight_override() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["dose", "epinephrine", "--weight-kg", "10"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0.10 mg"));
}

#[test]
fn test_dose_capped_at_maximum() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["dose", "epinephrine", "--weight-kg", "150"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 mg"))
        .stdout(predicate::str::contains("capped at maximum dose"));
}

#[test]
fn test_dose_without_patient_data() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["dose", "epinephrine"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Add patient info"));
}

#[test]
fn test_size_formula_fallback() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["size", "ett-uncuffed", "--age-months", "48"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5.0 mm"))
        .stdout(predicate::str::contains("computed by formula"));
}

#[test]
fn test_size_chart_match() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["size", "laryngoscope-blade", "--weight-kg", "7"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Miller 1"));
}

#[test]
fn test_vitals_by_age() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["vitals", "heart-rate", "--age-months", "6"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Infant"))
        .stdout(predicate::str::contains("100\u{2013}160 bpm"));
}

#[test]
fn test_weight_estimation() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["weight", "--age-months", "48"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("16.0 kg"));

    cli()
        .args(["weight", "--age-months", "48", "--method", "luscombe"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("19.0 kg"));
}

#[test]
fn test_profile_set_show_reset() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["profile", "set", "--weight-kg", "14.5", "--age-months", "36"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile saved"));

    cli()
        .args(["profile", "show"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Weight: 14.5 kg"))
        .stdout(predicate::str::contains("Age: 36 months"));

    // A stored profile feeds resolution without overrides
    cli()
        .args(["dose", "amiodarone"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("72.5 mg").or(predicate::str::contains("73 mg")));

    cli()
        .args(["profile", "reset"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile cleared"));

    cli()
        .args(["profile", "show"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No patient profile stored"));
}

#[test]
fn test_seed_is_idempotent() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("seed")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    let first = record_count(temp_dir.path(), "medications");
    assert!(first > 0);

    cli()
        .arg("seed")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    assert_eq!(record_count(temp_dir.path(), "medications"), first);
}

#[test]
fn test_resolution_seeds_on_first_use() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["dose", "epinephrine", "--weight-kg", "10"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    // Reference collections were seeded as a side effect
    assert!(temp_dir.path().join("medications.json").exists());
    assert!(temp_dir.path().join("equipment.json").exists());
    assert!(temp_dir.path().join("vital_signs.json").exists());
    // User collections were not
    assert!(!temp_dir.path().join("contacts.json").exists());
}

#[test]
fn test_contacts_roundtrip() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["contacts", "add", "Poison Control", "1-800-222-1222"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added contact Poison Control"));

    cli()
        .args(["contacts", "list"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Poison Control"))
        .stdout(predicate::str::contains("1-800-222-1222"));
}

#[test]
fn test_checklist_roundtrip() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["checklist", "add", "Check suction setup"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .args(["checklist", "list"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ]"))
        .stdout(predicate::str::contains("Check suction setup"));
}

#[test]
fn test_prefs_change_default_method() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["prefs", "--method", "luscombe"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("luscombe"));

    // The stored preference drives estimation from now on
    cli()
        .args(["weight", "--age-months", "48"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("19.0 kg"));
}

#[test]
fn test_unknown_medication_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["dose", "no-such-drug", "--weight-kg", "10"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}
