//! # Wizard Session
//!
//! Combines the form store with the navigator. This is the one object a
//! front-end holds: it is passed in explicitly, never reached through a
//! global, so tests can run it over a `MemoryKvStore`.
//!
//! ## Saving a step
//!
//! `save_section` validates the section as it would look after the patch.
//! On success the patch is persisted and the navigator advances; on failure
//! nothing is written and the report is handed back for display.

use crate::navigator::{Navigator, StepStatus};
use crate::primitives::WIZARD_SESSION_KEY;
use crate::review::{self, ReviewReport};
use crate::storage::KeyValueStore;
use crate::store::FormStore;
use crate::validation::{self, ValidationReport};
use crate::{
    DocumentSlot, EnrolError, FormData, Section, SectionRecord, Step, StoredDocument, documents,
};

/// Result of submitting a step form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Saved; the wizard moved to this step.
    Advanced(Step),
    /// Not saved; the section did not validate.
    Rejected(ValidationReport),
}

/// Form store plus navigator, persisted side by side.
#[derive(Debug)]
pub struct WizardSession<S: KeyValueStore> {
    store: FormStore<S>,
    navigator: Navigator,
}

impl<S: KeyValueStore> WizardSession<S> {
    /// Open a session, restoring saved form data and navigator state.
    pub fn open(kv: S) -> Self {
        let navigator = load_navigator(&kv);
        Self {
            store: FormStore::open(kv),
            navigator,
        }
    }

    #[must_use]
    pub fn form(&self) -> &FormData {
        self.store.get()
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[must_use]
    pub fn store(&self) -> &FormStore<S> {
        &self.store
    }

    // =========================================================================
    // STEP FORMS
    // =========================================================================

    /// Validate and save a section, then advance.
    ///
    /// Outside edit mode the section's step must be reachable.
    pub fn save_section(
        &mut self,
        section: Section,
        patch: &SectionRecord,
    ) -> Result<StepOutcome, EnrolError> {
        let editing_this = self.navigator.is_editing() && self.navigator.current() == section.step();
        if !editing_this && !Navigator::is_reachable(section.step(), self.form()) {
            return Err(EnrolError::StepLocked(section.step()));
        }

        let mut merged = self.form().section(section).clone();
        merged.merge(patch);
        let report = validation::validate(section, &merged);
        if !report.is_complete() {
            tracing::debug!(
                %section,
                missing = report.missing_fields.len(),
                errors = report.errors.len(),
                "section rejected"
            );
            return Ok(StepOutcome::Rejected(report));
        }

        self.store.update_section(section, patch)?;
        let next = self.navigator.complete_step(section);
        self.persist_navigator()?;
        tracing::info!(%section, next = %next, "section saved");
        Ok(StepOutcome::Advanced(next))
    }

    /// Record an uploaded file's name in the documents section.
    ///
    /// Call only after the bytes reached the blob store.
    pub fn record_document(
        &mut self,
        slot: DocumentSlot,
        document: &StoredDocument,
    ) -> Result<(), EnrolError> {
        self.store
            .update_section(Section::Documents, &documents::metadata_patch(slot, document))
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// "Edit" from review: jump to `section` and return to review after saving.
    ///
    /// Refused with `StepLocked(Review)` while review is not reachable.
    pub fn begin_edit(&mut self, section: Section) -> Result<(), EnrolError> {
        self.navigator.begin_edit(section, self.store.get())?;
        self.persist_navigator()
    }

    /// Direct navigation, guarded by reachability.
    pub fn goto(&mut self, step: Step) -> Result<Step, EnrolError> {
        let step = self.navigator.goto(step, self.store.get())?;
        self.persist_navigator()?;
        Ok(step)
    }

    #[must_use]
    pub fn progress(&self) -> Vec<StepStatus> {
        self.navigator.progress(self.form())
    }

    #[must_use]
    pub fn review(&self) -> ReviewReport {
        review::validate_all(self.form())
    }

    /// Clear the form, the navigator and their durable records.
    pub fn logout(&mut self) -> Result<(), EnrolError> {
        self.store.clear()?;
        self.navigator = Navigator::new();
        self.store.kv_mut().remove(WIZARD_SESSION_KEY)
    }

    /// Give back the engine.
    pub fn into_inner(self) -> S {
        self.store.into_inner()
    }

    fn persist_navigator(&mut self) -> Result<(), EnrolError> {
        let json = serde_json::to_string(&self.navigator)
            .map_err(|e| EnrolError::SerializationError(e.to_string()))?;
        self.store.kv_mut().write(WIZARD_SESSION_KEY, &json)
    }
}

fn load_navigator<S: KeyValueStore>(kv: &S) -> Navigator {
    match kv.read(WIZARD_SESSION_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "saved wizard session is corrupted, starting over");
            Navigator::new()
        }),
        Ok(None) => Navigator::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read wizard session, starting over");
            Navigator::new()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
