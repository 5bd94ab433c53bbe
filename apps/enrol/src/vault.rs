//! # Document Vault
//!
//! Async face of the blob store. redb is synchronous, so every call runs on
//! the blocking pool and is awaited from the runtime.
//!
//! Reads never fail the caller: a broken or missing bundle is logged and
//! reported as `None`, and every slot then counts as not uploaded.

use crate::AppError;
use enrol_core::{BlobStore, DocumentBundle, DocumentSlot, RedbBlobStore, StoredDocument};
use std::path::Path;
use std::sync::Arc;

/// Shared handle to the document blob store.
#[derive(Clone)]
pub struct DocumentVault {
    store: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for DocumentVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentVault").finish_non_exhaustive()
    }
}

impl DocumentVault {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Open the redb database at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let store = RedbBlobStore::open(path)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Replace the stored bundle.
    pub async fn save_document_data(&self, bundle: DocumentBundle) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        let slots = bundle.iter().count();
        run_blocking(move || store.save_bundle(&bundle)).await?;
        tracing::debug!(slots, "document bundle saved");
        Ok(())
    }

    /// The stored bundle, or `None` when absent or unreadable.
    pub async fn load_document_data(&self) -> Option<DocumentBundle> {
        let store = Arc::clone(&self.store);
        match run_blocking(move || store.load_bundle()).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load document bundle");
                None
            }
        }
    }

    pub async fn clear_document_data(&self) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.clear_bundle()).await?;
        tracing::info!("document bundle cleared");
        Ok(())
    }

    /// Add one document to the stored bundle and return the new bundle.
    ///
    /// Unlike `load_document_data`, a failed read is an error here: saving
    /// over an unread bundle would drop every other slot.
    pub async fn store_document(
        &self,
        slot: DocumentSlot,
        document: StoredDocument,
    ) -> Result<DocumentBundle, AppError> {
        let store = Arc::clone(&self.store);
        let mut bundle = run_blocking(move || store.load_bundle())
            .await?
            .unwrap_or_default();
        bundle.insert(slot, document);
        self.save_document_data(bundle.clone()).await?;
        Ok(bundle)
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, enrol_core::EnrolError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Task(e.to_string()))?
        .map_err(AppError::from)
}
