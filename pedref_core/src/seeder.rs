//! One-time, idempotent seeding of reference collections.
//!
//! Seeding reads the collection and bulk-puts the bundled defaults only
//! when it is empty; every later launch is a no-op. Because `put` is an
//! upsert keyed by id, even a concurrent duplicate seed is harmless.
//! User collections are never seeded through this path.

use crate::store::FileStore;
use crate::types::{Collection, StoredRecord};

/// Seed a reference collection from bundled defaults if it is empty.
///
/// Returns true when the defaults were written (or the collection was
/// already populated); false on a store soft-failure.
pub fn seed_if_empty(
    store: &FileStore,
    collection: Collection,
    defaults: &[StoredRecord],
) -> bool {
    if !collection.is_reference() {
        tracing::warn!(
            "Refusing to seed user collection '{}'",
            collection.as_str()
        );
        return false;
    }

    if !store.is_available() {
        tracing::debug!(
            "Store unavailable, skipping seed of '{}'",
            collection.as_str()
        );
        return false;
    }

    let existing = store.get_all(collection);
    if !existing.is_empty() {
        tracing::debug!(
            "Collection '{}' already has {} records, not seeding",
            collection.as_str(),
            existing.len()
        );
        return true;
    }

    let ok = store.put_many(collection, defaults.to_vec());
    if ok {
        tracing::info!(
            "Seeded collection '{}' with {} records",
            collection.as_str(),
            defaults.len()
        );
    } else {
        tracing::warn!("Seeding collection '{}' failed", collection.as_str());
    }
    ok
}
