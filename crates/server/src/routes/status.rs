use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct StatusUp {
    pub status: String,
    pub db_status: String,
    pub compressor_tasks_count: u64,
}

#[derive(Serialize, ToSchema)]
pub struct StatusDown {
    pub status: String,
    pub db_status: String,
    pub message: String,
}

#[utoipa::path(get, path = "/status", tag = "status", responses(
    (status = 200, description = "Database reachable", body = StatusUp),
    (status = 500, description = "Database unreachable", body = StatusDown)
))]
pub async fn status(State(state): State<AppState>) -> Response {
    match state.services.ledger.liveness().await {
        Ok(n) => Json(StatusUp { status: "ok".into(), db_status: "connected".into(), compressor_tasks_count: n }).into_response(),
        Err(e) => {
            error!(service = "server", event = "status_check_failed", error = %e);
            let body = StatusDown { status: "error".into(), db_status: "disconnected".into(), message: e.to_string() };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
