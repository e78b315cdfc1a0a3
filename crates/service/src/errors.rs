use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Backing store unreachable or the query failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// A stored document no longer decodes into its model.
    #[error("corrupt document: {0}")]
    Corrupt(String),
    #[error("http client error: {0}")]
    Http(String),
    /// Server-side failure unrelated to storage or HTTP.
    #[error("internal error: {0}")]
    Internal(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidArgument(msg.into()) }

    pub fn store(e: impl std::fmt::Display) -> Self { Self::StoreUnavailable(e.to_string()) }

    /// Whether the caller sent bad input (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidArgument(_) | ServiceError::Model(models::errors::ModelError::Validation(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_not_labelled_as_http() {
        let e = ServiceError::Internal("metrics encode error: boom".into());
        assert_eq!(e.to_string(), "internal error: metrics encode error: boom");
        assert!(!e.is_client_error());
    }
}
