use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::task::TaskStatus;
use models::value::{FieldValue, Fields};

pub use models::holiday::HolidayDocument;

pub type TaskId = Uuid;
pub type BlobId = Uuid;

/// Task as the service layer sees it (wire names match the compressor's documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "_id")]
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub params: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_file_id: Option<BlobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl TaskRecord {
    /// Name of the file the submitter uploaded (`params.raw_filename`).
    pub fn original_filename(&self) -> Option<&str> {
        self.params.get("raw_filename").and_then(FieldValue::as_str)
    }
}

/// Size figures reported by the database itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    pub data_size_bytes: u64,
    pub collections: u64,
}

/// Result of a merge-upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Modified,
    Unchanged,
}

impl UpsertOutcome {
    pub fn changed(self) -> bool { !matches!(self, UpsertOutcome::Unchanged) }

    pub fn as_str(self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Modified => "modified",
            UpsertOutcome::Unchanged => "unchanged",
        }
    }
}

/// Merge `incoming` over `existing`; keys absent from `incoming` are kept.
pub fn merge_fields(existing: &Fields, incoming: Fields) -> (Fields, bool) {
    let mut merged = existing.clone();
    merged.extend(incoming);
    let changed = &merged != existing;
    (merged, changed)
}
