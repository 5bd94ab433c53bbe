//! # Document Slots
//!
//! The four uploads of the documents step and their rules.
//!
//! A document lives in two places:
//! - its display (file) name in the `documents` section of the form store
//! - its bytes and preview data URI in a `DocumentBundle`, kept in the blob store
//!
//! The form store never sees the bytes.

use crate::preview::encode_data_uri;
use crate::primitives::{MAX_DOCUMENT_SIZE, MAX_PHOTO_SIZE};
use crate::{EnrolError, SectionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// SLOTS
// =============================================================================

/// A named upload of the documents step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentSlot {
    PassportPhoto,
    BirthCertificate,
    TerminalResult,
    MedicalReport,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::PassportPhoto,
        DocumentSlot::BirthCertificate,
        DocumentSlot::TerminalResult,
        DocumentSlot::MedicalReport,
    ];

    /// Field key in the `documents` section.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PassportPhoto => "passportPhoto",
            Self::BirthCertificate => "birthCertificate",
            Self::TerminalResult => "terminalResult",
            Self::MedicalReport => "medicalReport",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PassportPhoto => "Passport Photograph",
            Self::BirthCertificate => "Birth Certificate",
            Self::TerminalResult => "Terminal Result / Testimonial",
            Self::MedicalReport => "Medical Report",
        }
    }

    /// Required before final submission.
    #[must_use]
    pub const fn required(self) -> bool {
        !matches!(self, Self::MedicalReport)
    }

    /// Upload size limit in bytes.
    #[must_use]
    pub const fn max_size(self) -> u64 {
        match self {
            Self::PassportPhoto => MAX_PHOTO_SIZE,
            _ => MAX_DOCUMENT_SIZE,
        }
    }

    /// Photo slot takes images only, the others take images or PDF.
    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        let image = content_type.starts_with("image/");
        match self {
            Self::PassportPhoto => image,
            _ => image || content_type == "application/pdf",
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentSlot {
    type Err = EnrolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentSlot::ALL
            .into_iter()
            .find(|slot| slot.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnrolError::InvalidChoice {
                list: "DocumentSlot",
                value: s.to_string(),
            })
    }
}

/// MIME type guessed from a file name's extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// STORED DOCUMENT
// =============================================================================

/// An uploaded file: bytes plus its preview representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// `data:` URI of the file, ready for display.
    pub preview: String,
}

impl StoredDocument {
    /// Build a document for `slot`, enforcing the slot's size and type rules.
    pub fn new(
        slot: DocumentSlot,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, EnrolError> {
        let file_name = file_name.into();
        let size = bytes.len() as u64;
        if size > slot.max_size() {
            return Err(EnrolError::FileTooLarge {
                slot: slot.label().to_string(),
                size,
                max: slot.max_size(),
            });
        }

        let content_type = content_type_for(&file_name);
        if !slot.accepts(content_type) {
            return Err(EnrolError::UnsupportedFileType {
                slot: slot.label().to_string(),
                content_type: content_type.to_string(),
            });
        }

        Ok(Self {
            preview: encode_data_uri(content_type, &bytes),
            content_type: content_type.to_string(),
            file_name,
            bytes,
        })
    }
}

// =============================================================================
// BUNDLE
// =============================================================================

/// Every uploaded document, keyed by slot. Stored as one blob record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentBundle {
    documents: BTreeMap<DocumentSlot, StoredDocument>,
}

impl DocumentBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a document into its slot, replacing any previous one.
    pub fn insert(&mut self, slot: DocumentSlot, document: StoredDocument) -> Option<StoredDocument> {
        self.documents.insert(slot, document)
    }

    pub fn remove(&mut self, slot: DocumentSlot) -> Option<StoredDocument> {
        self.documents.remove(&slot)
    }

    #[must_use]
    pub fn get(&self, slot: DocumentSlot) -> Option<&StoredDocument> {
        self.documents.get(&slot)
    }

    #[must_use]
    pub fn contains(&self, slot: DocumentSlot) -> bool {
        self.documents.contains_key(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentSlot, &StoredDocument)> {
        self.documents.iter().map(|(slot, doc)| (*slot, doc))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total payload bytes across all slots.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.documents.values().map(|doc| doc.bytes.len()).sum()
    }
}

/// The `documents` section entry recording an upload.
#[must_use]
pub fn metadata_patch(slot: DocumentSlot, document: &StoredDocument) -> SectionRecord {
    SectionRecord::new().with(slot.key(), document.file_name.clone())
}

/// Drop file names whose blob is missing: such slots count as not uploaded.
///
/// With no bundle at all every slot is treated as missing.
#[must_use]
pub fn reconcile(record: &SectionRecord, bundle: Option<&DocumentBundle>) -> SectionRecord {
    let mut reconciled = record.clone();
    for slot in DocumentSlot::ALL {
        let present = bundle.is_some_and(|b| b.contains(slot));
        if !present && reconciled.remove(slot.key()).is_some() {
            tracing::warn!(slot = slot.key(), "document recorded but blob missing");
        }
    }
    reconciled
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Section, validation};

    #[test]
    fn slot_keys_match_validation_table() {
        for slot in DocumentSlot::ALL {
            let spec = validation::field(Section::Documents, slot.key()).expect("field exists");
            assert_eq!(spec.label, slot.label());
            assert_eq!(spec.required, slot.required());
        }
    }

    #[test]
    fn photo_rejects_pdf() {
        let result = StoredDocument::new(DocumentSlot::PassportPhoto, "photo.pdf", vec![1, 2]);
        assert!(matches!(
            result,
            Err(EnrolError::UnsupportedFileType { .. })
        ));

        let ok = StoredDocument::new(DocumentSlot::BirthCertificate, "cert.PDF", vec![1, 2]);
        assert!(ok.is_ok());
    }

    #[test]
    fn oversized_photo_rejected() {
        let bytes = vec![0u8; (MAX_PHOTO_SIZE + 1) as usize];
        let result = StoredDocument::new(DocumentSlot::PassportPhoto, "me.jpg", bytes);
        assert!(matches!(result, Err(EnrolError::FileTooLarge { .. })));
    }

    #[test]
    fn stored_document_carries_preview() {
        let doc = StoredDocument::new(DocumentSlot::MedicalReport, "report.png", vec![0x89, 0x50])
            .expect("document");
        assert_eq!(doc.content_type, "image/png");
        assert!(doc.preview.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn reconcile_drops_orphaned_names() {
        let record = SectionRecord::new()
            .with("passportPhoto", "me.jpg")
            .with("birthCertificate", "cert.pdf");
        let mut bundle = DocumentBundle::new();
        bundle.insert(
            DocumentSlot::PassportPhoto,
            StoredDocument::new(DocumentSlot::PassportPhoto, "me.jpg", vec![1]).expect("doc"),
        );

        let reconciled = reconcile(&record, Some(&bundle));
        assert_eq!(reconciled.get("passportPhoto"), Some("me.jpg"));
        assert_eq!(reconciled.get("birthCertificate"), None);

        assert!(reconcile(&record, None).is_empty());
    }
}
