use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use models::task::{TaskStatus, KIND_COMPRESS};

use crate::blob::BlobStore;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::store::{LedgerStore, TaskFilter, TaskRecord};

/// Upper bound on the recent-activity listing.
pub const ACTIVE_TASKS_LIMIT: u64 = 20;

pub const DEFAULT_ACTIVE_WINDOW_MINUTES: i64 = 10;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CompressionStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    /// Percentage with two decimals; zero when there are no tasks.
    pub success_rate: f64,
    pub storage_used_bytes: u64,
    pub storage_used_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FileEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    pub file_size: u64,
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FilePage {
    pub files: Vec<FileEntry>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Read-only view over compression jobs.
#[derive(Clone)]
pub struct TaskLedger {
    store: Arc<dyn LedgerStore>,
    blobs: BlobStore,
}

impl TaskLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { blobs: BlobStore::new(store.clone()), store }
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<CompressionStats, ServiceError> {
        let total_tasks = self.store.count_tasks(&TaskFilter::all()).await?;
        let completed_tasks = self.store.count_tasks(&TaskFilter::status(TaskStatus::Completed)).await?;
        let failed_tasks = self.store.count_tasks(&TaskFilter::status(TaskStatus::Failed)).await?;
        let storage_used_bytes = self.blobs.total_bytes().await?;
        Ok(CompressionStats {
            total_tasks,
            completed_tasks,
            failed_tasks,
            success_rate: success_rate(completed_tasks, total_tasks),
            storage_used_bytes,
            storage_used_mb: bytes_to_mb(storage_used_bytes),
        })
    }

    /// Tasks created within `window` (default ten minutes), newest first.
    #[instrument(skip(self))]
    pub async fn list_active(&self, window: Option<Duration>) -> Result<Vec<TaskRecord>, ServiceError> {
        let window = window.unwrap_or_else(|| Duration::minutes(DEFAULT_ACTIVE_WINDOW_MINUTES));
        let filter = TaskFilter { statuses: TaskStatus::ALL.to_vec(), ..TaskFilter::default() }.since(Utc::now() - window);
        let tasks = self.store.find_tasks(&filter, 0, ACTIVE_TASKS_LIMIT).await?;
        debug!(service = "task_ledger", event = "active_listed", count = tasks.len());
        Ok(tasks)
    }

    /// One page of completed compression outputs with their blob sizes.
    #[instrument(skip(self), fields(page = p.page, limit = p.per_page))]
    pub async fn list_completed_files(&self, p: Pagination) -> Result<FilePage, ServiceError> {
        let (skip, limit) = p.bounds()?;
        let filter = completed_files_filter();
        let total = self.store.count_tasks(&filter).await?;
        let tasks = self.store.find_tasks(&filter, skip, limit).await?;

        let mut files = Vec::with_capacity(tasks.len());
        for t in tasks {
            let file_size = match t.result_file_id {
                Some(blob) => self.blobs.lookup_size(blob).await?.unwrap_or(0),
                None => 0,
            };
            files.push(FileEntry {
                id: t.id,
                original_filename: t.original_filename().unwrap_or(UNKNOWN).to_string(),
                filename: t.result_filename.unwrap_or_else(|| UNKNOWN.to_string()),
                created_at: t.created_at,
                file_size,
                ip_address: t.ip_address.unwrap_or_else(|| UNKNOWN.to_string()),
            });
        }

        Ok(FilePage { files, total, page: p.page, limit: p.per_page, total_pages: p.total_pages(total) })
    }

    /// Ping the store, then count every task.
    pub async fn liveness(&self) -> Result<u64, ServiceError> {
        self.store.ping().await?;
        self.store.count_tasks(&TaskFilter::all()).await
    }
}

fn completed_files_filter() -> TaskFilter {
    TaskFilter {
        kind: Some(KIND_COMPRESS.to_string()),
        statuses: vec![TaskStatus::Completed],
        created_since: None,
        with_result_file: true,
    }
}

pub fn success_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(completed as f64 / total as f64 * 100.0)
}

pub fn bytes_to_mb(bytes: u64) -> f64 { round2(bytes as f64 / BYTES_PER_MB) }

pub fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }
