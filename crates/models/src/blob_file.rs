use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{blob_chunk, errors::ModelError};

/// 255 KiB, the chunk size the compressor writes with.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blob_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub filename: Option<String>,
    /// Declared payload length in bytes.
    pub length: i64,
    pub chunk_size: i32,
    pub upload_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Chunks }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Chunks => Entity::has_many(blob_chunk::Entity).into(),
        }
    }
}

impl Related<blob_chunk::Entity> for Entity {
    fn to() -> RelationDef { Relation::Chunks.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Write a payload as one metadata row plus its chunks, in one transaction.
pub async fn store(
    db: &DatabaseConnection,
    filename: Option<&str>,
    payload: &[u8],
    chunk_size: usize,
) -> Result<Model, ModelError> {
    if chunk_size == 0 {
        return Err(ModelError::Validation("chunk_size must be > 0".into()));
    }
    let id = Uuid::new_v4();
    let txn = db.begin().await?;

    let meta = ActiveModel {
        id: Set(id),
        filename: Set(filename.map(str::to_string)),
        length: Set(payload.len() as i64),
        chunk_size: Set(chunk_size as i32),
        upload_date: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    for (n, chunk) in payload.chunks(chunk_size).enumerate() {
        blob_chunk::ActiveModel {
            files_id: Set(id),
            n: Set(n as i32),
            data: Set(chunk.to_vec()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    debug!(blob_id = %id, length = payload.len(), "blob stored");
    Ok(meta)
}
