//! Small key-value engines for string records.

use crate::EnrolError;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A synchronous key-value engine for small string records.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, EnrolError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), EnrolError>;

    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), EnrolError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// One JSON file per key inside a data directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, EnrolError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            EnrolError::StorageError(format!("Cannot create '{}': {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKvStore {
    fn read(&self, key: &str) -> Result<Option<String>, EnrolError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EnrolError::StorageError(format!("read {key}: {e}"))),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), EnrolError> {
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&staging, value)
            .map_err(|e| EnrolError::StorageError(format!("write {key}: {e}")))?;
        std::fs::rename(&staging, &target)
            .map_err(|e| EnrolError::StorageError(format!("commit {key}: {e}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), EnrolError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EnrolError::StorageError(format!("remove {key}: {e}"))),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile store, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    records: BTreeMap<String, String>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn read(&self, key: &str) -> Result<Option<String>, EnrolError> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), EnrolError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), EnrolError> {
        self.records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_roundtrip_and_remove() {
        let temp = tempdir().expect("temp dir");
        let mut store = FileKvStore::open(temp.path().join("data")).expect("open");

        assert_eq!(store.read("formData").expect("read"), None);
        store.write("formData", "{\"a\":1}").expect("write");
        assert_eq!(
            store.read("formData").expect("read").as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("formData").expect("remove");
        store.remove("formData").expect("second remove is a no-op");
        assert_eq!(store.read("formData").expect("read"), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        {
            let mut store = FileKvStore::open(temp.path()).expect("open");
            store.write("wizardSession", "x").expect("write");
        }
        let store = FileKvStore::open(temp.path()).expect("reopen");
        assert_eq!(store.read("wizardSession").expect("read").as_deref(), Some("x"));
    }
}
