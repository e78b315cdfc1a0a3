use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::types::ErrorBody;
use service::errors::ServiceError;

/// Handler error rendered as `{"error": <message>}`.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn unauthorized() -> Self { Self::new(StatusCode::FORBIDDEN, "unauthorized") }

    pub fn internal(message: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, message) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        if e.is_client_error() {
            return ApiError::bad_request(e.to_string());
        }
        error!(service = "server", event = "request_failed", error = %e);
        ApiError::internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self { ApiError::bad_request(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self { ApiError::bad_request(r.body_text()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ModelError;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(ApiError::from(ServiceError::invalid("x")).status, StatusCode::BAD_REQUEST);
        let e = ServiceError::Model(ModelError::Validation("bad".into()));
        assert_eq!(ApiError::from(e).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_errors_map_to_500() {
        assert_eq!(ApiError::from(ServiceError::store("down")).status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(ServiceError::Corrupt("x".into())).status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(ServiceError::Internal("x".into())).status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
