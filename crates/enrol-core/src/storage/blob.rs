//! # Blob Storage
//!
//! Large-record persistence for the document bundle.
//!
//! The bundle is a single record under `DOCUMENT_BUNDLE_KEY`; saving
//! overwrites it. `RedbBlobStore` gives crash-safe, quota-free storage for
//! multi-megabyte uploads. All methods take `&self` so one store can be
//! shared across blocking worker threads.

use crate::formats::{bundle_from_bytes, bundle_to_bytes};
use crate::primitives::DOCUMENT_BUNDLE_KEY;
use crate::{DocumentBundle, EnrolError};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Mutex;

/// Table for blobs: record key -> encoded bundle bytes.
const BLOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("document_blobs");

/// Persistence for the document bundle.
pub trait BlobStore: Send + Sync {
    /// Replace the stored bundle.
    fn save_bundle(&self, bundle: &DocumentBundle) -> Result<(), EnrolError>;

    /// Read the stored bundle, `None` when nothing was saved.
    fn load_bundle(&self) -> Result<Option<DocumentBundle>, EnrolError>;

    fn clear_bundle(&self) -> Result<(), EnrolError>;
}

// =============================================================================
// REDB STORE
// =============================================================================

/// A disk-backed blob store using the redb embedded database.
pub struct RedbBlobStore {
    db: Database,
}

impl std::fmt::Debug for RedbBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBlobStore").finish_non_exhaustive()
    }
}

impl RedbBlobStore {
    /// Open or create a blob database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EnrolError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| EnrolError::StorageError(e.to_string()))?;

        // Initialize the table so first reads do not fail.
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
            let _ = write_txn
                .open_table(BLOBS)
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        }

        Ok(Self { db })
    }
}

impl BlobStore for RedbBlobStore {
    fn save_bundle(&self, bundle: &DocumentBundle) -> Result<(), EnrolError> {
        let bytes = bundle_to_bytes(bundle)?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(BLOBS)
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
            table
                .insert(DOCUMENT_BUNDLE_KEY, bytes.as_slice())
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EnrolError::StorageError(e.to_string()))
    }

    fn load_bundle(&self) -> Result<Option<DocumentBundle>, EnrolError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(BLOBS)
            .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        let Some(record) = table
            .get(DOCUMENT_BUNDLE_KEY)
            .map_err(|e| EnrolError::StorageError(e.to_string()))?
        else {
            return Ok(None);
        };
        bundle_from_bytes(record.value()).map(Some)
    }

    fn clear_bundle(&self) -> Result<(), EnrolError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(BLOBS)
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
            table
                .remove(DOCUMENT_BUNDLE_KEY)
                .map_err(|e| EnrolError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EnrolError::StorageError(e.to_string()))
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile blob store. Keeps the encoded form so the format is exercised.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    record: Mutex<Option<Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<Vec<u8>>>, EnrolError> {
        self.record
            .lock()
            .map_err(|_| EnrolError::StorageError("blob store lock poisoned".to_string()))
    }
}

impl BlobStore for MemoryBlobStore {
    fn save_bundle(&self, bundle: &DocumentBundle) -> Result<(), EnrolError> {
        let bytes = bundle_to_bytes(bundle)?;
        *self.slot()? = Some(bytes);
        Ok(())
    }

    fn load_bundle(&self) -> Result<Option<DocumentBundle>, EnrolError> {
        match self.slot()?.as_deref() {
            Some(bytes) => bundle_from_bytes(bytes).map(Some),
            None => Ok(None),
        }
    }

    fn clear_bundle(&self) -> Result<(), EnrolError> {
        *self.slot()? = None;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentSlot, StoredDocument};
    use tempfile::tempdir;

    fn photo_bundle(bytes: Vec<u8>) -> DocumentBundle {
        let mut bundle = DocumentBundle::new();
        bundle.insert(
            DocumentSlot::PassportPhoto,
            StoredDocument::new(DocumentSlot::PassportPhoto, "photo.jpg", bytes).expect("doc"),
        );
        bundle
    }

    #[test]
    fn empty_store_loads_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbBlobStore::open(temp.path().join("blobs.redb")).expect("open");
        assert!(store.load_bundle().expect("load").is_none());
    }

    #[test]
    fn save_overwrites_previous_bundle() {
        let temp = tempdir().expect("temp dir");
        let store = RedbBlobStore::open(temp.path().join("blobs.redb")).expect("open");

        store.save_bundle(&photo_bundle(vec![1, 2, 3])).expect("save");
        let newer = photo_bundle(vec![4, 5, 6]);
        store.save_bundle(&newer).expect("save again");

        assert_eq!(store.load_bundle().expect("load"), Some(newer));
    }

    #[test]
    fn multi_megabyte_bundle_persists_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("blobs.redb");
        let big = photo_bundle(vec![0xAB; 8 * 1024 * 1024]);

        {
            let store = RedbBlobStore::open(&path).expect("open");
            store.save_bundle(&big).expect("save");
        }

        let store = RedbBlobStore::open(&path).expect("reopen");
        let loaded = store.load_bundle().expect("load").expect("bundle present");
        assert_eq!(loaded.total_bytes(), 8 * 1024 * 1024);
    }

    #[test]
    fn clear_removes_bundle() {
        let temp = tempdir().expect("temp dir");
        let store = RedbBlobStore::open(temp.path().join("blobs.redb")).expect("open");
        store.save_bundle(&photo_bundle(vec![7])).expect("save");

        store.clear_bundle().expect("clear");
        store.clear_bundle().expect("clearing twice is fine");
        assert!(store.load_bundle().expect("load").is_none());
    }

    #[test]
    fn memory_store_behaves_like_redb() {
        let store = MemoryBlobStore::new();
        assert!(store.load_bundle().expect("load").is_none());

        let bundle = photo_bundle(vec![9, 9]);
        store.save_bundle(&bundle).expect("save");
        assert_eq!(store.load_bundle().expect("load"), Some(bundle));

        store.clear_bundle().expect("clear");
        assert!(store.load_bundle().expect("load").is_none());
    }
}
