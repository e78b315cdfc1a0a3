use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use common::types::MessageBody;
use service::calendar::outcome_message;
use service::errors::ServiceError;
use service::store::HolidayDocument;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HolidayQuery {
    /// Four-digit year
    pub year: Option<String>,
    /// 1..=12
    pub month: Option<String>,
}

#[utoipa::path(get, path = "/get_holidays", tag = "calendar", params(HolidayQuery), responses(
    (status = 200, description = "Holidays of the month", body = [crate::openapi::HolidayDoc]),
    (status = 400, description = "Missing or invalid year/month", body = crate::openapi::ErrorDoc)
))]
pub async fn get_holidays(
    State(state): State<AppState>,
    query: Result<Query<HolidayQuery>, QueryRejection>,
) -> Result<Json<Vec<HolidayDocument>>, ApiError> {
    let Query(q) = query?;
    let docs = state.services.calendar.query(q.year.as_deref(), q.month.as_deref()).await?;
    Ok(Json(docs))
}

#[utoipa::path(post, path = "/update_holiday", tag = "calendar", request_body = crate::openapi::HolidayDoc, responses(
    (status = 200, description = "Saved or unchanged", body = crate::openapi::MessageDoc),
    (status = 400, description = "Missing _id or unsupported field", body = crate::openapi::ErrorDoc)
))]
pub async fn update_holiday(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(raw) = body?;
    let doc = HolidayDocument::from_json(raw).map_err(ServiceError::from)?;
    let outcome = state.services.calendar.upsert(doc).await?;
    Ok(Json(MessageBody { message: outcome_message(outcome).to_string(), outcome: Some(outcome.as_str().to_string()) }))
}
