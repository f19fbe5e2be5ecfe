//! Durable key-value store organized into named collections.
//!
//! One JSON file per collection under the data directory, read under a
//! shared lock and replaced atomically (temp file + rename) under an
//! exclusive lock.
//!
//! Failure semantics: every public operation catches platform errors and
//! resolves to a soft value (`false` / `None` / `[]`) instead of
//! propagating, so callers can treat "store unavailable" identically to
//! "store empty" and fall back to the bundled in-memory catalog.

use crate::types::{Collection, StoredRecord};
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// File-backed collection store
pub struct FileStore {
    root: PathBuf,
    available: bool,
}

impl FileStore {
    /// Open a store rooted at the given directory, probing durable
    /// storage exactly once. An unwritable root yields a store that
    /// reports unavailable and soft-fails every operation.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let available = match probe(&root) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Durable storage unavailable at {:?}: {}. Running from bundled data only.",
                    root,
                    e
                );
                false
            }
        };
        Self { root, available }
    }

    /// Whether durable storage was usable at startup
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Read a single record by id
    pub fn get(&self, collection: Collection, id: &str) -> Option<StoredRecord> {
        self.get_all(collection).into_iter().find(|r| r.id == id)
    }

    /// Read all records in a collection; empty on any failure
    pub fn get_all(&self, collection: Collection) -> Vec<StoredRecord> {
        if !self.available {
            return Vec::new();
        }
        match self.read_collection(collection) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to read collection '{}': {}", collection.as_str(), e);
                Vec::new()
            }
        }
    }

    /// Upsert one record, keyed by id
    pub fn put(&self, collection: Collection, record: StoredRecord) -> bool {
        self.put_many(collection, vec![record])
    }

    /// Upsert a batch of records. Best-effort: valid records are written
    /// even when some are rejected, but success is reported only when
    /// zero records failed.
    pub fn put_many(&self, collection: Collection, records: Vec<StoredRecord>) -> bool {
        if !self.available {
            return false;
        }

        let mut rejected = 0;
        let mut accepted = Vec::with_capacity(records.len());
        for record in records {
            if record.id.is_empty() {
                tracing::warn!(
                    "Rejected record with empty id in collection '{}'",
                    collection.as_str()
                );
                rejected += 1;
            } else {
                accepted.push(record);
            }
        }

        let result = self.update_collection(collection, |existing| {
            for record in accepted {
                match existing.iter_mut().find(|r| r.id == record.id) {
                    Some(slot) => *slot = record,
                    None => existing.push(record),
                }
            }
        });

        match result {
            Ok(()) => rejected == 0,
            Err(e) => {
                tracing::warn!(
                    "Failed to write collection '{}': {}",
                    collection.as_str(),
                    e
                );
                false
            }
        }
    }

    /// Remove a record by id; false when absent or on failure
    pub fn delete(&self, collection: Collection, id: &str) -> bool {
        if !self.available {
            return false;
        }
        let mut removed = false;
        let result = self.update_collection(collection, |existing| {
            let before = existing.len();
            existing.retain(|r| r.id != id);
            removed = existing.len() != before;
        });
        match result {
            Ok(()) => removed,
            Err(e) => {
                tracing::warn!(
                    "Failed to delete '{}' from '{}': {}",
                    id,
                    collection.as_str(),
                    e
                );
                false
            }
        }
    }

    /// Remove every record in a collection
    pub fn clear(&self, collection: Collection) -> bool {
        if !self.available {
            return false;
        }
        match self.write_collection(collection, &[]) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to clear collection '{}': {}",
                    collection.as_str(),
                    e
                );
                false
            }
        }
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.root.join(format!("{}.json", collection.as_str()))
    }

    fn read_collection(&self, collection: Collection) -> Result<Vec<StoredRecord>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        match serde_json::from_str::<Vec<StoredRecord>>(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                // A corrupt collection file reads as empty rather than
                // poisoning every caller
                tracing::warn!("Corrupt collection file {:?}: {}", path, e);
                Ok(Vec::new())
            }
        }
    }

    /// Load, mutate, and atomically rewrite a collection under lock
    fn update_collection<F>(&self, collection: Collection, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<StoredRecord>),
    {
        let mut records = self.read_collection(collection)?;
        mutate(&mut records);
        self.write_collection(collection, &records)
    }

    fn write_collection(&self, collection: Collection, records: &[StoredRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.collection_path(collection);

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(&self.root)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(records)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Wrote {} records to collection '{}'",
            records.len(),
            collection.as_str()
        );
        Ok(())
    }
}

/// Probe the root directory for durable-storage capability
fn probe(root: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(root)?;
    let probe_path = root.join(".probe");
    std::fs::write(&probe_path, b"ok")?;
    std::fs::remove_file(&probe_path)?;
    Ok(())
}
