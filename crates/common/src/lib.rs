//! Pieces shared by every crate in the workspace: tracing setup and the
//! small JSON bodies the HTTP surface returns.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_serializes_under_error_key() {
        let body = types::ErrorBody::new("unauthorized");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"error": "unauthorized"}));
    }

    #[test]
    fn message_body_skips_missing_outcome() {
        let v = serde_json::to_value(types::MessageBody { message: "saved".into(), outcome: None }).unwrap();
        assert_eq!(v, serde_json::json!({"message": "saved"}));
    }
}
