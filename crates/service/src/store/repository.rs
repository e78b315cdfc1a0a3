use async_trait::async_trait;
use chrono::{DateTime, Utc};

use models::task::TaskStatus;

use super::domain::{BlobId, DatabaseStats, HolidayDocument, TaskId, TaskRecord, UpsertOutcome};
use crate::errors::ServiceError;

/// Fixed task filters. Built by the service layer only; callers never pass
/// arbitrary queries through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub kind: Option<String>,
    /// Empty means any status.
    pub statuses: Vec<TaskStatus>,
    pub created_since: Option<DateTime<Utc>>,
    /// Only tasks carrying a `result_file_id`.
    pub with_result_file: bool,
}

impl TaskFilter {
    pub fn all() -> Self { Self::default() }

    pub fn status(status: TaskStatus) -> Self {
        Self { statuses: vec![status], ..Self::default() }
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.created_since = Some(at);
        self
    }

    pub fn matches(&self, t: &TaskRecord) -> bool {
        self.kind.as_deref().map_or(true, |k| t.kind == k)
            && (self.statuses.is_empty() || self.statuses.contains(&t.status))
            && self.created_since.map_or(true, |since| t.created_at >= since)
            && (!self.with_result_file || t.result_file_id.is_some())
    }
}

/// Task collection plus the blob metadata/chunk pair of the ledger database.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn ping(&self) -> Result<(), ServiceError>;
    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, ServiceError>;
    /// Newest first; equal `created_at` ordered by id descending.
    async fn find_tasks(&self, filter: &TaskFilter, skip: u64, limit: u64) -> Result<Vec<TaskRecord>, ServiceError>;
    async fn find_tasks_by_ids(&self, ids: &[TaskId]) -> Result<Vec<TaskRecord>, ServiceError>;
    /// Returns whether a row was removed.
    async fn delete_task(&self, id: TaskId) -> Result<bool, ServiceError>;
    async fn blob_length(&self, id: BlobId) -> Result<Option<u64>, ServiceError>;
    async fn total_blob_bytes(&self) -> Result<u64, ServiceError>;
    /// Remove metadata and every chunk. Absent blobs are a no-op.
    async fn delete_blob(&self, id: BlobId) -> Result<(), ServiceError>;
    async fn database_stats(&self) -> Result<DatabaseStats, ServiceError>;
}

/// Holiday collection.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn ping(&self) -> Result<(), ServiceError>;
    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<HolidayDocument>, ServiceError>;
    async fn upsert_merge(&self, doc: HolidayDocument) -> Result<UpsertOutcome, ServiceError>;
    async fn count(&self) -> Result<u64, ServiceError>;
}
