//! Integration tests for the async document vault.

use enrol::DocumentVault;
use enrol_core::{
    BlobStore, DocumentBundle, DocumentSlot, EnrolError, MemoryBlobStore, StoredDocument,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

fn photo() -> StoredDocument {
    StoredDocument::new(DocumentSlot::PassportPhoto, "me.jpg", vec![0xFF, 0xD8, 0xFF])
        .expect("document")
}

#[tokio::test]
async fn empty_vault_loads_none() {
    let temp = tempdir().expect("temp dir");
    let vault = DocumentVault::open(temp.path().join("documents.redb")).expect("open");
    assert_eq!(vault.load_document_data().await, None);
}

#[tokio::test]
async fn stored_documents_accumulate_and_survive_reopen() {
    let temp = tempdir().expect("temp dir");
    let path = temp.path().join("documents.redb");
    {
        let vault = DocumentVault::open(&path).expect("open");
        vault
            .store_document(DocumentSlot::PassportPhoto, photo())
            .await
            .expect("store photo");
        let certificate =
            StoredDocument::new(DocumentSlot::BirthCertificate, "birth.pdf", b"%PDF-1.4".to_vec())
                .expect("document");
        let bundle = vault
            .store_document(DocumentSlot::BirthCertificate, certificate)
            .await
            .expect("store certificate");
        assert_eq!(bundle.iter().count(), 2);
    }

    let vault = DocumentVault::open(&path).expect("reopen");
    let bundle = vault.load_document_data().await.expect("bundle");
    assert_eq!(
        bundle.get(DocumentSlot::PassportPhoto).map(|d| d.file_name.as_str()),
        Some("me.jpg")
    );
    assert!(bundle.contains(DocumentSlot::BirthCertificate));
}

#[tokio::test]
async fn clear_removes_bundle() {
    let vault = DocumentVault::new(Arc::new(MemoryBlobStore::new()));
    let mut bundle = DocumentBundle::new();
    bundle.insert(DocumentSlot::PassportPhoto, photo());
    vault.save_document_data(bundle).await.expect("save");

    vault.clear_document_data().await.expect("clear");
    assert_eq!(vault.load_document_data().await, None);
}

/// A store whose reads always fail.
struct BrokenStore;

impl BlobStore for BrokenStore {
    fn save_bundle(&self, _bundle: &DocumentBundle) -> Result<(), EnrolError> {
        Err(EnrolError::StorageError("disk full".to_string()))
    }

    fn load_bundle(&self) -> Result<Option<DocumentBundle>, EnrolError> {
        Err(EnrolError::StorageError("corrupted".to_string()))
    }

    fn clear_bundle(&self) -> Result<(), EnrolError> {
        Ok(())
    }
}

#[tokio::test]
async fn failed_read_is_reported_as_absent() {
    let vault = DocumentVault::new(Arc::new(BrokenStore));
    assert_eq!(vault.load_document_data().await, None);
    assert!(vault.save_document_data(DocumentBundle::new()).await.is_err());
}

/// Delegates to a memory store but fails the read numbered `fail_on`.
struct FlakyStore {
    inner: MemoryBlobStore,
    reads: AtomicUsize,
    fail_on: usize,
}

impl BlobStore for FlakyStore {
    fn save_bundle(&self, bundle: &DocumentBundle) -> Result<(), EnrolError> {
        self.inner.save_bundle(bundle)
    }

    fn load_bundle(&self) -> Result<Option<DocumentBundle>, EnrolError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            return Err(EnrolError::StorageError("transient read failure".to_string()));
        }
        self.inner.load_bundle()
    }

    fn clear_bundle(&self) -> Result<(), EnrolError> {
        self.inner.clear_bundle()
    }
}

#[tokio::test]
async fn failed_read_during_store_keeps_other_slots() {
    let store = Arc::new(FlakyStore {
        inner: MemoryBlobStore::new(),
        reads: AtomicUsize::new(0),
        fail_on: 1,
    });
    let vault = DocumentVault::new(store);

    vault
        .store_document(DocumentSlot::PassportPhoto, photo())
        .await
        .expect("store photo");

    let certificate =
        StoredDocument::new(DocumentSlot::BirthCertificate, "birth.pdf", b"%PDF".to_vec())
            .expect("document");
    let result = vault
        .store_document(DocumentSlot::BirthCertificate, certificate)
        .await;
    assert!(result.is_err());

    let bundle = vault.load_document_data().await.expect("bundle");
    assert!(bundle.contains(DocumentSlot::PassportPhoto));
    assert!(!bundle.contains(DocumentSlot::BirthCertificate));
}
