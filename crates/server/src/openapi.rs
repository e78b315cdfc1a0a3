use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

use service::health::{
    DatabaseHealth, HealthReport, OverallStatus, ProbeStatus, ServiceHealth, ServicesHealth, StorageUsage,
};
use service::ledger::{CompressionStats, FileEntry, FilePage};

use crate::routes::admin::{BatchDeleteRequest, BatchDeleteResponse};
use crate::routes::status::{StatusDown, StatusUp};

/// Holiday document: `_id` (`YYYYMMDD`) plus free-form scalar attributes
/// (string, number, boolean or RFC 3339 timestamp).
#[derive(Serialize, ToSchema)]
pub struct HolidayDoc {
    #[serde(rename = "_id")]
    #[schema(example = "20250101")]
    pub id: String,
    #[schema(example = "New Year's Day")]
    pub name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TaskDoc {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "type")]
    #[schema(example = "compress")]
    pub kind: String,
    #[schema(example = "processing")]
    pub status: String,
    pub created_at: String,
    #[schema(value_type = Object)]
    pub params: serde_json::Value,
    pub result_filename: Option<String>,
    pub result_file_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageDoc {
    pub message: String,
    #[schema(example = "created")]
    pub outcome: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDoc {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::status::status,
        crate::routes::calendar::get_holidays,
        crate::routes::calendar::update_holiday,
        crate::routes::admin::compression_stats,
        crate::routes::admin::active_tasks,
        crate::routes::admin::all_files,
        crate::routes::admin::batch_delete,
        crate::routes::admin::system_health,
        crate::routes::admin::metrics,
    ),
    components(
        schemas(
            StatusUp,
            StatusDown,
            HolidayDoc,
            TaskDoc,
            MessageDoc,
            ErrorDoc,
            CompressionStats,
            FileEntry,
            FilePage,
            BatchDeleteRequest,
            BatchDeleteResponse,
            HealthReport,
            DatabaseHealth,
            ServicesHealth,
            ServiceHealth,
            StorageUsage,
            ProbeStatus,
            OverallStatus,
        )
    ),
    tags(
        (name = "status"),
        (name = "calendar"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for path in [
            "/status",
            "/get_holidays",
            "/update_holiday",
            "/admin/api/compression-stats",
            "/admin/api/active-tasks",
            "/admin/api/all-files",
            "/admin/api/batch-delete",
            "/admin/api/system-health",
            "/admin/metrics",
        ] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
    }
}
