//! HTTP surface: public calendar/status routes, secret-gated admin routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;

use crate::auth::require_admin_secret;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod admin;
pub mod calendar;
pub mod status;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/status", get(status::status))
        .route("/get_holidays", get(calendar::get_holidays))
        .route("/update_holiday", post(calendar::update_holiday))
        .route("/api-docs/openapi.json", get(openapi_json));

    let admin_routes = Router::new()
        .route("/admin/api/compression-stats", get(admin::compression_stats))
        .route("/admin/api/active-tasks", get(admin::active_tasks))
        .route("/admin/api/all-files", get(admin::all_files))
        .route("/admin/api/batch-delete", post(admin::batch_delete))
        .route("/admin/api/system-health", get(admin::system_health))
        .route("/admin/metrics", get(admin::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin_secret));

    public
        .merge(admin_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
