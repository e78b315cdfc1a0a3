use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::AppState;

pub const ADMIN_SECRET_HEADER: &str = "X-Admin-Secret";

/// Middleware: the `X-Admin-Secret` header must equal the configured secret.
pub async fn require_admin_secret(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let presented = req.headers().get(ADMIN_SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !secret_matches(presented, &state.admin_secret) {
        warn!(service = "server", event = "admin_rejected", path = %req.uri().path());
        return ApiError::unauthorized().into_response();
    }
    next.run(req).await
}

fn secret_matches(presented: Option<&str>, expected: &str) -> bool {
    match presented {
        Some(p) if !expected.is_empty() && p.len() == expected.len() => {
            // constant-time over equal lengths
            p.bytes().zip(expected.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::secret_matches;

    #[test]
    fn matches_only_exact_secret() {
        assert!(secret_matches(Some("s3cret"), "s3cret"));
        assert!(!secret_matches(Some("s3cre"), "s3cret"));
        assert!(!secret_matches(Some("S3cret"), "s3cret"));
        assert!(!secret_matches(None, "s3cret"));
        assert!(!secret_matches(Some(""), ""));
    }
}
