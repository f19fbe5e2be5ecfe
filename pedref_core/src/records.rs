//! User-authored records: contacts, checklist items, and preferences.
//!
//! These are thin typed layers over the store's collection contract.
//! User collections start empty and are populated only through explicit
//! creation; the seeder never touches them. Rows that fail to parse are
//! skipped with a warning rather than failing the whole listing.

use crate::estimator::EstimationMethod;
use crate::store::FileStore;
use crate::types::{Collection, StoredRecord};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// An emergency contact
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(name: impl Into<String>, role: Option<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            phone: phone.into(),
            created_at: Utc::now(),
        }
    }
}

/// One item of the user's preparation checklist
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub text: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            done: false,
            created_at: Utc::now(),
        }
    }
}

/// User preferences, the single record of the `preferences` collection
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub estimation_method: EstimationMethod,
}

const PREFERENCES_RECORD_ID: &str = "preferences";

pub fn add_contact(store: &FileStore, contact: &Contact) -> bool {
    put_typed(store, Collection::Contacts, &contact.id.to_string(), contact)
}

/// All contacts, sorted by name
pub fn list_contacts(store: &FileStore) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = list_typed(store, Collection::Contacts);
    contacts.sort_by(|a, b| a.name.cmp(&b.name));
    contacts
}

pub fn remove_contact(store: &FileStore, id: Uuid) -> bool {
    store.delete(Collection::Contacts, &id.to_string())
}

pub fn add_checklist_item(store: &FileStore, item: &ChecklistItem) -> bool {
    put_typed(store, Collection::Checklists, &item.id.to_string(), item)
}

/// All checklist items, oldest first
pub fn list_checklist(store: &FileStore) -> Vec<ChecklistItem> {
    let mut items: Vec<ChecklistItem> = list_typed(store, Collection::Checklists);
    items.sort_by_key(|i| i.created_at);
    items
}

/// Mark a checklist item done (or not). Returns false when the item is
/// missing or the store soft-fails.
pub fn set_checklist_done(store: &FileStore, id: Uuid, done: bool) -> bool {
    let Some(record) = store.get(Collection::Checklists, &id.to_string()) else {
        return false;
    };
    let mut item: ChecklistItem = match serde_json::from_value(record.payload) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!("Unreadable checklist item {}: {}", id, e);
            return false;
        }
    };
    item.done = done;
    put_typed(store, Collection::Checklists, &id.to_string(), &item)
}

pub fn remove_checklist_item(store: &FileStore, id: Uuid) -> bool {
    store.delete(Collection::Checklists, &id.to_string())
}

pub fn load_preferences(store: &FileStore) -> Preferences {
    let Some(record) = store.get(Collection::Preferences, PREFERENCES_RECORD_ID) else {
        return Preferences::default();
    };
    match serde_json::from_value(record.payload) {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::warn!("Stored preferences unreadable: {}. Using defaults.", e);
            Preferences::default()
        }
    }
}

pub fn save_preferences(store: &FileStore, preferences: &Preferences) -> bool {
    put_typed(
        store,
        Collection::Preferences,
        PREFERENCES_RECORD_ID,
        preferences,
    )
}

fn put_typed<T: Serialize>(store: &FileStore, collection: Collection, id: &str, value: &T) -> bool {
    match StoredRecord::from_serialize(id, value) {
        Ok(record) => store.put(collection, record),
        Err(e) => {
            tracing::warn!(
                "Failed to serialize record for '{}': {}",
                collection.as_str(),
                e
            );
            false
        }
    }
}

fn list_typed<T: DeserializeOwned>(store: &FileStore, collection: Collection) -> Vec<T> {
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
