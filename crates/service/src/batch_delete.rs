use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::errors::ServiceError;
use crate::metrics::BATCH_DELETED_TASKS_TOTAL;
use crate::store::{LedgerStore, TaskId, TaskRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchDeleteOutcome {
    pub deleted_count: u64,
}

/// Parse caller-supplied ids. Rejects an empty list and any malformed id;
/// duplicates collapse while keeping first-seen order.
pub fn parse_task_ids(raw: &[String]) -> Result<Vec<TaskId>, ServiceError> {
    if raw.is_empty() {
        return Err(ServiceError::invalid("no task ids provided"));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    let mut ids = Vec::with_capacity(raw.len());
    for s in raw {
        let id = Uuid::parse_str(s.trim()).map_err(|_| ServiceError::invalid(format!("invalid task id: {s}")))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Removes tasks together with their result blobs.
#[derive(Clone)]
pub struct BatchDeleter {
    store: Arc<dyn LedgerStore>,
    blobs: BlobStore,
}

impl BatchDeleter {
    pub fn new(store: Arc<dyn LedgerStore>, blobs: BlobStore) -> Self { Self { store, blobs } }

    /// Delete each resolvable task, blob first. Unknown ids are skipped.
    /// Not transactional: an error stops the batch and is returned as-is.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_batch(&self, ids: &[TaskId]) -> Result<BatchDeleteOutcome, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::invalid("no task ids provided"));
        }
        let tasks = self.store.find_tasks_by_ids(ids).await?;

        let mut deleted_count = 0u64;
        for t in tasks {
            match self.delete_one(&t).await {
                Ok(true) => deleted_count += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(service = "batch_delete", event = "task_delete_failed", task_id = %t.id, error = %e);
                    BATCH_DELETED_TASKS_TOTAL.inc_by(deleted_count);
                    return Err(e);
                }
            }
        }

        BATCH_DELETED_TASKS_TOTAL.inc_by(deleted_count);
        info!(service = "batch_delete", event = "batch_deleted", deleted_count);
        Ok(BatchDeleteOutcome { deleted_count })
    }

    /// Blob first; the task record stays if that fails.
    async fn delete_one(&self, t: &TaskRecord) -> Result<bool, ServiceError> {
        if let Some(blob) = t.result_file_id {
            self.blobs.delete(blob).await?;
        }
        self.store.delete_task(t.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::test_support::{completed_with_blob, task_at};
    use chrono::Utc;
    use models::task::TaskStatus;

    fn deleter(mem: &MemoryStore) -> BatchDeleter {
        let store: Arc<dyn LedgerStore> = Arc::new(mem.clone());
        BatchDeleter::new(store.clone(), BlobStore::new(store))
    }

    #[test]
    fn parse_rejects_empty_and_malformed() {
        assert!(parse_task_ids(&[]).unwrap_err().is_client_error());
        let bad = vec![Uuid::new_v4().to_string(), "not-an-id".to_string()];
        assert!(parse_task_ids(&bad).unwrap_err().is_client_error());
    }

    #[test]
    fn parse_collapses_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = vec![a.to_string(), b.to_string(), a.to_string()];
        assert_eq!(parse_task_ids(&raw).unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn deletes_task_blob_and_chunks() {
        let mem = MemoryStore::new();
        let t = completed_with_blob(&mem, Utc::now(), 600 * 1024, Some("big.zip")).await;
        let blob = t.result_file_id.unwrap();
        assert_eq!(mem.chunk_count(blob).await, 3);

        let out = deleter(&mem).delete_batch(&[t.id]).await.unwrap();
        assert_eq!(out.deleted_count, 1);
        assert!(!mem.has_task(t.id).await);
        assert!(!mem.has_blob(blob).await);
        assert_eq!(mem.chunk_count(blob).await, 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_skipped() {
        let mem = MemoryStore::new();
        let t = task_at(TaskStatus::Failed, Utc::now());
        mem.insert_task(t.clone()).await;

        let out = deleter(&mem).delete_batch(&[t.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(out.deleted_count, 1);
    }

    #[tokio::test]
    async fn empty_batch_is_invalid() {
        let err = deleter(&MemoryStore::new()).delete_batch(&[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn failure_after_blob_leaves_dangling_reference() {
        let mem = MemoryStore::new();
        let t = completed_with_blob(&mem, Utc::now(), 10, None).await;
        mem.set_fail_task_deletes(true);

        let err = deleter(&mem).delete_batch(&[t.id]).await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
        assert!(mem.has_task(t.id).await);
        assert!(!mem.has_blob(t.result_file_id.unwrap()).await);
    }

    #[tokio::test]
    async fn blob_delete_failure_keeps_the_task() {
        let mem = MemoryStore::new();
        let t = completed_with_blob(&mem, Utc::now(), 10, None).await;
        mem.set_fail_blob_deletes(true);

        let err = deleter(&mem).delete_batch(&[t.id]).await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
        assert!(mem.has_task(t.id).await);
        assert!(mem.has_blob(t.result_file_id.unwrap()).await);

        mem.set_fail_blob_deletes(false);
        let out = deleter(&mem).delete_batch(&[t.id]).await.unwrap();
        assert_eq!(out.deleted_count, 1);
    }
}
