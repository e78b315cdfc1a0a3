use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::domain::{merge_fields, BlobId, DatabaseStats, HolidayDocument, TaskId, TaskRecord, UpsertOutcome};
use super::repository::{CalendarStore, LedgerStore, TaskFilter};
use crate::errors::ServiceError;

#[derive(Default)]
struct State {
    tasks: HashMap<TaskId, TaskRecord>,
    /// blob id -> declared length
    blobs: HashMap<BlobId, u64>,
    /// blob id -> chunk count
    chunks: HashMap<BlobId, usize>,
    holidays: BTreeMap<String, HolidayDocument>,
}

/// In-process store used by tests and local demos. Failure switches let
/// callers simulate an unreachable database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    unavailable: Arc<AtomicBool>,
    fail_task_deletes: Arc<AtomicBool>,
    fail_blob_deletes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Every call fails with `StoreUnavailable` while set.
    pub fn set_unavailable(&self, on: bool) { self.unavailable.store(on, Ordering::SeqCst); }

    /// Only task deletion fails while set.
    pub fn set_fail_task_deletes(&self, on: bool) { self.fail_task_deletes.store(on, Ordering::SeqCst); }

    /// Only blob deletion fails while set.
    pub fn set_fail_blob_deletes(&self, on: bool) { self.fail_blob_deletes.store(on, Ordering::SeqCst); }

    fn check(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::store("memory store marked unavailable"));
        }
        Ok(())
    }

    pub async fn insert_task(&self, task: TaskRecord) {
        self.state.write().await.tasks.insert(task.id, task);
    }

    /// Store a payload split into `chunk_size` pieces and return its id.
    pub async fn put_blob(&self, payload: &[u8], chunk_size: usize) -> BlobId {
        let id = Uuid::new_v4();
        let chunks = if chunk_size == 0 { 0 } else { payload.len().div_ceil(chunk_size) };
        let mut st = self.state.write().await;
        st.blobs.insert(id, payload.len() as u64);
        st.chunks.insert(id, chunks);
        id
    }

    pub async fn chunk_count(&self, id: BlobId) -> usize {
        self.state.read().await.chunks.get(&id).copied().unwrap_or(0)
    }

    pub async fn has_blob(&self, id: BlobId) -> bool { self.state.read().await.blobs.contains_key(&id) }

    pub async fn has_task(&self, id: TaskId) -> bool { self.state.read().await.tasks.contains_key(&id) }

    pub async fn holiday(&self, id: &str) -> Option<HolidayDocument> {
        self.state.read().await.holidays.get(id).cloned()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ping(&self) -> Result<(), ServiceError> { self.check() }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, ServiceError> {
        self.check()?;
        let st = self.state.read().await;
        Ok(st.tasks.values().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn find_tasks(&self, filter: &TaskFilter, skip: u64, limit: u64) -> Result<Vec<TaskRecord>, ServiceError> {
        self.check()?;
        let st = self.state.read().await;
        let mut found: Vec<TaskRecord> = st.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found.into_iter().skip(skip as usize).take(limit as usize).collect())
    }

    async fn find_tasks_by_ids(&self, ids: &[TaskId]) -> Result<Vec<TaskRecord>, ServiceError> {
        self.check()?;
        let st = self.state.read().await;
        Ok(ids.iter().filter_map(|id| st.tasks.get(id).cloned()).collect())
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, ServiceError> {
        self.check()?;
        if self.fail_task_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::store("task delete rejected"));
        }
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }

    async fn blob_length(&self, id: BlobId) -> Result<Option<u64>, ServiceError> {
        self.check()?;
        Ok(self.state.read().await.blobs.get(&id).copied())
    }

    async fn total_blob_bytes(&self) -> Result<u64, ServiceError> {
        self.check()?;
        Ok(self.state.read().await.blobs.values().sum())
    }

    async fn delete_blob(&self, id: BlobId) -> Result<(), ServiceError> {
        self.check()?;
        if self.fail_blob_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::store("blob delete rejected"));
        }
        let mut st = self.state.write().await;
        st.chunks.remove(&id);
        st.blobs.remove(&id);
        Ok(())
    }

    async fn database_stats(&self) -> Result<DatabaseStats, ServiceError> {
        self.check()?;
        let st = self.state.read().await;
        let data_size_bytes = st.blobs.values().sum::<u64>() + (st.tasks.len() as u64) * 256;
        Ok(DatabaseStats { data_size_bytes, collections: 4 })
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn ping(&self) -> Result<(), ServiceError> { self.check() }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<HolidayDocument>, ServiceError> {
        self.check()?;
        let st = self.state.read().await;
        Ok(st
            .holidays
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn upsert_merge(&self, doc: HolidayDocument) -> Result<UpsertOutcome, ServiceError> {
        self.check()?;
        let mut st = self.state.write().await;
        match st.holidays.entry(doc.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(doc);
                Ok(UpsertOutcome::Created)
            }
            Entry::Occupied(mut slot) => {
                let (merged, changed) = merge_fields(&slot.get().fields, doc.fields);
                if !changed {
                    return Ok(UpsertOutcome::Unchanged);
                }
                slot.get_mut().fields = merged;
                Ok(UpsertOutcome::Modified)
            }
        }
    }

    async fn count(&self) -> Result<u64, ServiceError> {
        self.check()?;
        Ok(self.state.read().await.holidays.len() as u64)
    }
}
