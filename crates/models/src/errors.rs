use sea_orm::DbErr;
use thiserror::Error;

/// Failures raised by entity helpers before or while touching the database.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<DbErr> for ModelError {
    fn from(e: DbErr) -> Self { ModelError::Db(e.to_string()) }
}
