//! # Persistent Form Store
//!
//! The single source of truth for the form aggregate.
//!
//! - Seeded by a synchronous read of the durable record at open, so the first
//!   screen already shows prior progress.
//! - Every `update_section` writes the whole aggregate through to storage.
//! - Corrupted durable data is never fatal: it is logged and replaced by an
//!   empty aggregate.

use crate::primitives::{FORM_DATA_KEY, MAX_FIELD_VALUE_LENGTH};
use crate::storage::KeyValueStore;
use crate::{EnrolError, FormData, Section, SectionRecord};

/// Form aggregate plus the engine it is persisted in.
#[derive(Debug)]
pub struct FormStore<S: KeyValueStore> {
    kv: S,
    data: FormData,
}

impl<S: KeyValueStore> FormStore<S> {
    /// Open the store, loading any saved aggregate.
    pub fn open(kv: S) -> Self {
        let data = load_aggregate(&kv);
        Self { kv, data }
    }

    /// Current aggregate.
    #[must_use]
    pub fn get(&self) -> &FormData {
        &self.data
    }

    /// Shallow-merge `patch` into a section and write the aggregate through.
    ///
    /// Values over `MAX_FIELD_VALUE_LENGTH` are refused before anything is
    /// merged: large payloads belong in the blob store.
    pub fn update_section(
        &mut self,
        section: Section,
        patch: &SectionRecord,
    ) -> Result<(), EnrolError> {
        if let Some((field, value)) = patch
            .iter()
            .find(|(_, value)| value.len() > MAX_FIELD_VALUE_LENGTH)
        {
            return Err(EnrolError::ValueTooLarge {
                section,
                field: field.to_string(),
                len: value.len(),
                max: MAX_FIELD_VALUE_LENGTH,
            });
        }

        self.data.section_mut(section).merge(patch);
        tracing::debug!(%section, fields = patch.len(), "section updated");
        self.persist()
    }

    /// Reset every section and remove the durable record.
    pub fn clear(&mut self) -> Result<(), EnrolError> {
        self.data = FormData::new();
        self.kv.remove(FORM_DATA_KEY)
    }

    /// Underlying engine, for records that live next to the aggregate.
    #[must_use]
    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    /// Give back the engine, e.g. to reopen over the same storage.
    pub fn into_inner(self) -> S {
        self.kv
    }

    fn persist(&mut self) -> Result<(), EnrolError> {
        let json = serde_json::to_string(&self.data)
            .map_err(|e| EnrolError::SerializationError(e.to_string()))?;
        self.kv.write(FORM_DATA_KEY, &json)
    }
}

/// Read the saved aggregate; anything unreadable counts as no prior data.
fn load_aggregate<S: KeyValueStore>(kv: &S) -> FormData {
    let raw = match kv.read(FORM_DATA_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return FormData::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read saved form data, starting empty");
            return FormData::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "saved form data is corrupted, starting empty");
        FormData::new()
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKvStore, MemoryKvStore};
    use tempfile::tempdir;

    #[test]
    fn update_survives_reload() {
        let mut store = FormStore::open(MemoryKvStore::new());
        store
            .update_section(Section::Personal, &SectionRecord::new().with("firstName", "Ama"))
            .expect("update");

        let reloaded = FormStore::open(store.into_inner());
        assert_eq!(reloaded.get().personal.get("firstName"), Some("Ama"));
    }

    #[test]
    fn update_merges_instead_of_replacing() {
        let mut store = FormStore::open(MemoryKvStore::new());
        store
            .update_section(Section::Health, &SectionRecord::new().with("bloodGroup", "O+"))
            .expect("update");
        store
            .update_section(Section::Health, &SectionRecord::new().with("genotype", "AA"))
            .expect("update");

        let health = &store.get().health;
        assert_eq!(health.get("bloodGroup"), Some("O+"));
        assert_eq!(health.get("genotype"), Some("AA"));
    }

    #[test]
    fn corrupted_record_falls_back_to_empty() {
        let mut kv = MemoryKvStore::new();
        kv.write(FORM_DATA_KEY, "{not json").expect("write");

        let store = FormStore::open(kv);
        assert!(store.get().is_empty());
    }

    #[test]
    fn clear_resets_and_removes_record() {
        let mut store = FormStore::open(MemoryKvStore::new());
        store
            .update_section(Section::Guardian, &SectionRecord::new().with("fullName", "Yaw"))
            .expect("update");

        store.clear().expect("clear");
        assert!(store.get().is_empty());
        assert_eq!(store.kv().read(FORM_DATA_KEY).expect("read"), None);
    }

    #[test]
    fn oversized_value_refused_and_not_merged() {
        let mut store = FormStore::open(MemoryKvStore::new());
        let blob = "A".repeat(MAX_FIELD_VALUE_LENGTH + 1);
        let result = store.update_section(
            Section::Documents,
            &SectionRecord::new()
                .with("passportPhoto", "me.jpg")
                .with("preview", blob),
        );

        assert!(matches!(result, Err(EnrolError::ValueTooLarge { .. })));
        assert!(store.get().documents.is_empty());
    }

    #[test]
    fn file_backed_store_reloads_from_disk() {
        let temp = tempdir().expect("temp dir");
        {
            let mut store = FormStore::open(FileKvStore::open(temp.path()).expect("open"));
            store
                .update_section(
                    Section::Academic,
                    &SectionRecord::new().with("schoolName", "Wesley Girls"),
                )
                .expect("update");
        }

        let store = FormStore::open(FileKvStore::open(temp.path()).expect("reopen"));
        assert_eq!(store.get().academic.get("schoolName"), Some("Wesley Girls"));
    }
}
