//! # enrol-core
//!
//! The admission wizard engine for Enrol - THE LOGIC.
//!
//! This crate holds everything a front-end needs to run the multi-step
//! admission intake without owning any of the rules itself:
//! - the form aggregate and its durable store (`store`)
//! - the document blob store and previews (`storage`, `documents`, `preview`)
//! - per-section validation (`validation`)
//! - step navigation and edit mode (`navigator`)
//! - the review gate and submission state machine (`review`)
//!
//! ## Architectural Constraints
//!
//! - Has NO async and NO network dependencies; the app layer wraps the
//!   blob store for async use and performs the submission request
//! - Never renders: previews are produced as data URIs
//! - Validation problems are values, not errors

// =============================================================================
// MODULES
// =============================================================================

pub mod documents;
pub mod formats;
pub mod navigator;
pub mod preview;
pub mod primitives;
pub mod review;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BloodGroup, ClassLevel, EnrolError, FormData, Gender, Genotype, Relationship, Section,
    SectionRecord, Step,
};

// =============================================================================
// RE-EXPORTS: Wizard Engine
// =============================================================================

pub use documents::{DocumentBundle, DocumentSlot, StoredDocument};
pub use navigator::{Navigator, StepStatus};
pub use preview::{PreviewResolver, PreviewSource};
pub use review::{
    AfterSubmit, ReviewReport, SubmissionState, SubmissionTracker, SummaryRow, validate_all,
};
pub use session::{StepOutcome, WizardSession};
pub use store::FormStore;
pub use validation::{FieldError, ValidationReport, validate};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use storage::{
    BlobStore, FileKvStore, KeyValueStore, MemoryBlobStore, MemoryKvStore, RedbBlobStore,
};
