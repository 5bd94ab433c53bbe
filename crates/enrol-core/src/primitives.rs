//! # Wizard Primitives
//!
//! Fixed constants for the Enrol wizard core.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Storage keys are shared with any other front-end reading the same data
//! directory, so they must not change between releases.

/// Durable record key holding the serialized form aggregate.
pub const FORM_DATA_KEY: &str = "formData";

/// Durable record key holding the navigator session (step + edit flag).
pub const WIZARD_SESSION_KEY: &str = "wizardSession";

/// Blob store record key holding the document bundle.
pub const DOCUMENT_BUNDLE_KEY: &str = "documentData";

/// Number of digits in a phone number.
pub const PHONE_DIGITS: usize = 10;

/// Maximum length of a single value in the small form store (4 KB).
///
/// Anything larger belongs in the blob store. This keeps the aggregate
/// well under the quota of small key-value engines.
pub const MAX_FIELD_VALUE_LENGTH: usize = 4096;

/// Magic bytes for the document bundle binary format header.
pub const BUNDLE_MAGIC: &[u8; 4] = b"ENRB";

/// Current document bundle format version.
pub const BUNDLE_FORMAT_VERSION: u8 = 1;

/// Maximum encoded size of a document bundle (four slots of 20 MB, base64
/// previews included).
pub const MAX_BUNDLE_SIZE: usize = 256 * 1024 * 1024;

const MEGABYTE: u64 = 1024 * 1024;

/// Upload limit for the passport photograph.
pub const MAX_PHOTO_SIZE: u64 = 10 * MEGABYTE;

/// Upload limit for every other document slot.
pub const MAX_DOCUMENT_SIZE: u64 = 20 * MEGABYTE;

/// Default bound on a submission request, in seconds.
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;

/// Fixed path of the admission submission endpoint.
pub const SUBMIT_PATH: &str = "/api/admissions";
