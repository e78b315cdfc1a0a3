use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::store::{BlobId, LedgerStore};

/// Chunked binary payloads owned by completed tasks.
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn LedgerStore>,
}

impl BlobStore {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self { Self { store } }

    /// Declared byte length, or `None` when the blob does not exist.
    pub async fn lookup_size(&self, id: BlobId) -> Result<Option<u64>, ServiceError> {
        self.store.blob_length(id).await
    }

    /// Remove metadata and chunks. Deleting an absent blob succeeds.
    #[instrument(skip(self), fields(blob_id = %id))]
    pub async fn delete(&self, id: BlobId) -> Result<(), ServiceError> {
        self.store.delete_blob(id).await?;
        debug!(service = "blob_store", event = "blob_deleted", "blob deleted");
        Ok(())
    }

    pub async fn total_bytes(&self) -> Result<u64, ServiceError> {
        self.store.total_blob_bytes().await
    }
}
