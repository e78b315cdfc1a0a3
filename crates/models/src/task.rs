use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::value::{fields_to_json, Fields};

pub const KIND_COMPRESS: &str = "compress";

/// Lifecycle of a job: `waiting -> processing -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Waiting,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Job type, e.g. `compress`.
    pub kind: String,
    pub status: TaskStatus,
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "JsonBinary")]
    pub params: Json,
    pub result_filename: Option<String>,
    pub result_file_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Input for [`create`]. Tasks are produced by the compressor; this exists for
/// seeding and tests.
#[derive(Clone, Debug)]
pub struct NewTask {
    pub kind: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub params: Fields,
    pub result_filename: Option<String>,
    pub result_file_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

pub fn validate(t: &NewTask) -> Result<(), ModelError> {
    if t.kind.trim().is_empty() {
        return Err(ModelError::Validation("task kind required".into()));
    }
    if t.result_file_id.is_some() && t.status != TaskStatus::Completed {
        return Err(ModelError::Validation("only completed tasks may reference a result file".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, t: NewTask) -> Result<Model, ModelError> {
    validate(&t)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(t.kind),
        status: Set(t.status),
        created_at: Set(t.created_at.into()),
        params: Set(fields_to_json(&t.params)),
        result_filename: Set(t.result_filename),
        result_file_id: Set(t.result_file_id),
        ip_address: Set(t.ip_address),
    };
    Ok(am.insert(db).await?)
}
