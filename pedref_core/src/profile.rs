//! Patient profile persistence.
//!
//! The profile is the single record of the `patient_profile` collection.
//! It changes only through explicit save or reset; resolution calls
//! receive owned snapshots and never write derived values back, so an
//! estimated weight can never silently become the stored weight.

use crate::store::FileStore;
use crate::types::{Collection, PatientProfile, StoredRecord};

const PROFILE_RECORD_ID: &str = "patient";

/// Load the stored profile, or an empty one when nothing is stored or
/// the store soft-fails
pub fn load_profile(store: &FileStore) -> PatientProfile {
    let Some(record) = store.get(Collection::PatientProfile, PROFILE_RECORD_ID) else {
        return PatientProfile::default();
    };
    match serde_json::from_value(record.payload) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Stored patient profile is unreadable: {}. Using empty.", e);
            PatientProfile::default()
        }
    }
}

/// Persist the profile (full overwrite of the single record)
pub fn save_profile(store: &FileStore, profile: &PatientProfile) -> bool {
    match StoredRecord::from_serialize(PROFILE_RECORD_ID, profile) {
        Ok(record) => store.put(Collection::PatientProfile, record),
        Err(e) => {
            tracing::warn!("Failed to serialize patient profile: {}", e);
            false
        }
    }
}

/// Full clear of the stored profile
pub fn reset_profile(store: &FileStore) -> bool {
    store.clear(Collection::PatientProfile)
}
