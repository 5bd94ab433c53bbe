//! # Document Previews
//!
//! Previews are `data:<mime>;base64,<payload>` URIs. The core produces and
//! decodes them; displaying them is the front-end's job.
//!
//! ## Resolution order
//!
//! `PreviewResolver` answers "what should slot X show" from three tiers:
//! 1. the in-memory cache of previews produced this session
//! 2. the most recently set preview state
//! 3. the durable bundle from the blob store
//!
//! A durable read that resolves late can only fill tier 2 for slots the cache
//! does not know, so memory always wins over storage.

use crate::{DocumentBundle, DocumentSlot, EnrolError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Decode a base64 data URI into its content type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), EnrolError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| EnrolError::InvalidPreview("missing 'data:' scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EnrolError::InvalidPreview("missing ',' separator".to_string()))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| EnrolError::InvalidPreview("only base64 previews are supported".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| EnrolError::InvalidPreview(e.to_string()))?;
    Ok((content_type.to_string(), bytes))
}

/// Which tier answered a preview lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    Cache,
    Recent,
    Durable,
}

/// Three-tier preview lookup for the documents step.
#[derive(Debug, Clone, Default)]
pub struct PreviewResolver {
    cache: BTreeMap<DocumentSlot, String>,
    recent: BTreeMap<DocumentSlot, String>,
}

impl PreviewResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a preview produced by a fresh upload. Fills both memory tiers.
    pub fn record_upload(&mut self, slot: DocumentSlot, preview: impl Into<String>) {
        let preview = preview.into();
        self.recent.insert(slot, preview.clone());
        self.cache.insert(slot, preview);
    }

    /// Set the displayed preview state of a slot.
    pub fn set_recent(&mut self, slot: DocumentSlot, preview: impl Into<String>) {
        self.recent.insert(slot, preview.into());
    }

    /// Apply a durable read. Slots already in memory are left alone.
    pub fn hydrate(&mut self, bundle: &DocumentBundle) {
        for (slot, document) in bundle.iter() {
            if !self.cache.contains_key(&slot) && !self.recent.contains_key(&slot) {
                self.recent.insert(slot, document.preview.clone());
            }
        }
    }

    /// Forget a slot in every memory tier.
    pub fn forget(&mut self, slot: DocumentSlot) {
        self.cache.remove(&slot);
        self.recent.remove(&slot);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.recent.clear();
    }

    /// Resolve the preview of a slot: cache, then recent state, then storage.
    #[must_use]
    pub fn resolve<'a>(
        &'a self,
        slot: DocumentSlot,
        durable: Option<&'a DocumentBundle>,
    ) -> Option<(&'a str, PreviewSource)> {
        if let Some(preview) = self.cache.get(&slot) {
            return Some((preview.as_str(), PreviewSource::Cache));
        }
        if let Some(preview) = self.recent.get(&slot) {
            return Some((preview.as_str(), PreviewSource::Recent));
        }
        durable
            .and_then(|bundle| bundle.get(slot))
            .map(|document| (document.preview.as_str(), PreviewSource::Durable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoredDocument;

    fn bundle_with(slot: DocumentSlot, name: &str, bytes: &[u8]) -> DocumentBundle {
        let mut bundle = DocumentBundle::new();
        bundle.insert(
            slot,
            StoredDocument::new(slot, name, bytes.to_vec()).expect("document"),
        );
        bundle
    }

    #[test]
    fn data_uri_decodes_back() {
        let uri = encode_data_uri("application/pdf", b"%PDF-1.7");
        let (content_type, bytes) = decode_data_uri(&uri).expect("decode");
        assert_eq!(content_type, "application/pdf");
        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[test]
    fn malformed_data_uri_rejected() {
        assert!(decode_data_uri("http://example.com/a.png").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn memory_beats_storage() {
        let stale = bundle_with(DocumentSlot::PassportPhoto, "old.png", b"old");
        let mut resolver = PreviewResolver::new();
        let fresh = encode_data_uri("image/png", b"new");
        resolver.record_upload(DocumentSlot::PassportPhoto, fresh.clone());

        // A late durable read must not replace the fresh upload.
        resolver.hydrate(&stale);

        let (preview, source) = resolver
            .resolve(DocumentSlot::PassportPhoto, Some(&stale))
            .expect("preview");
        assert_eq!(preview, fresh);
        assert_eq!(source, PreviewSource::Cache);
    }

    #[test]
    fn recent_state_beats_storage() {
        let stored = bundle_with(DocumentSlot::BirthCertificate, "cert.pdf", b"stored");
        let mut resolver = PreviewResolver::new();
        resolver.set_recent(DocumentSlot::BirthCertificate, "data:image/png;base64,AA==");

        let (_, source) = resolver
            .resolve(DocumentSlot::BirthCertificate, Some(&stored))
            .expect("preview");
        assert_eq!(source, PreviewSource::Recent);
    }

    #[test]
    fn falls_back_to_storage() {
        let stored = bundle_with(DocumentSlot::TerminalResult, "result.pdf", b"stored");
        let resolver = PreviewResolver::new();

        let (preview, source) = resolver
            .resolve(DocumentSlot::TerminalResult, Some(&stored))
            .expect("preview");
        assert_eq!(source, PreviewSource::Durable);
        assert!(preview.starts_with("data:application/pdf;base64,"));
        assert!(resolver.resolve(DocumentSlot::MedicalReport, Some(&stored)).is_none());
    }

    #[test]
    fn hydrate_fills_unknown_slots() {
        let stored = bundle_with(DocumentSlot::MedicalReport, "report.jpg", b"img");
        let mut resolver = PreviewResolver::new();
        resolver.hydrate(&stored);

        let (_, source) = resolver
            .resolve(DocumentSlot::MedicalReport, None)
            .expect("preview");
        assert_eq!(source, PreviewSource::Recent);

        resolver.forget(DocumentSlot::MedicalReport);
        assert!(resolver.resolve(DocumentSlot::MedicalReport, None).is_none());
    }
}
