use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use service::batch_delete::parse_task_ids;
use service::health::HealthReport;
use service::ledger::{CompressionStats, FilePage};
use service::pagination::Pagination;
use service::store::TaskRecord;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct FilesQuery {
    /// 1-based, default 1
    pub page: Option<u64>,
    /// Page size, default 50
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub task_ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchDeleteResponse {
    pub success: bool,
    pub deleted_count: u64,
}

#[utoipa::path(get, path = "/admin/api/compression-stats", tag = "admin",
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Task and storage statistics", body = CompressionStats),
              (status = 403, description = "Missing or wrong secret", body = crate::openapi::ErrorDoc)))]
pub async fn compression_stats(State(state): State<AppState>) -> Result<Json<CompressionStats>, ApiError> {
    Ok(Json(state.services.ledger.statistics().await?))
}

#[utoipa::path(get, path = "/admin/api/active-tasks", tag = "admin",
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Tasks from the last ten minutes", body = [crate::openapi::TaskDoc]),
              (status = 403, description = "Missing or wrong secret", body = crate::openapi::ErrorDoc)))]
pub async fn active_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskRecord>>, ApiError> {
    Ok(Json(state.services.ledger.list_active(None).await?))
}

#[utoipa::path(get, path = "/admin/api/all-files", tag = "admin",
    params(FilesQuery, ("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "One page of completed files", body = FilePage),
              (status = 400, description = "Invalid page or limit", body = crate::openapi::ErrorDoc),
              (status = 403, description = "Missing or wrong secret", body = crate::openapi::ErrorDoc)))]
pub async fn all_files(
    State(state): State<AppState>,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> Result<Json<FilePage>, ApiError> {
    let Query(q) = query?;
    let page = state.services.ledger.list_completed_files(Pagination::new(q.page, q.limit)).await?;
    Ok(Json(page))
}

#[utoipa::path(post, path = "/admin/api/batch-delete", tag = "admin", request_body = BatchDeleteRequest,
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Number of tasks removed", body = BatchDeleteResponse),
              (status = 400, description = "Empty or malformed id list", body = crate::openapi::ErrorDoc),
              (status = 403, description = "Missing or wrong secret", body = crate::openapi::ErrorDoc)))]
pub async fn batch_delete(
    State(state): State<AppState>,
    body: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
    let Json(req) = body?;
    let ids = parse_task_ids(&req.task_ids)?;
    let outcome = state.services.batch.delete_batch(&ids).await?;
    info!(service = "server", event = "batch_delete", deleted = outcome.deleted_count);
    Ok(Json(BatchDeleteResponse { success: true, deleted_count: outcome.deleted_count }))
}

#[utoipa::path(get, path = "/admin/api/system-health", tag = "admin",
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Composite health report", body = HealthReport),
              (status = 403, description = "Missing or wrong secret", body = crate::openapi::ErrorDoc)))]
pub async fn system_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.services.health.compute().await)
}

#[utoipa::path(get, path = "/admin/metrics", tag = "admin",
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Prometheus text exposition", content_type = "text/plain")))]
pub async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = service::metrics::encode()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
