use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blob_file;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blob_chunk")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub files_id: Uuid,
    /// Zero-based chunk index within the file.
    pub n: i32,
    #[serde(skip)]
    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { File }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::File => Entity::belongs_to(blob_file::Entity)
                .from(Column::FilesId)
                .to(blob_file::Column::Id)
                .into(),
        }
    }
}

impl Related<blob_file::Entity> for Entity {
    fn to() -> RelationDef { Relation::File.def() }
}

impl ActiveModelBehavior for ActiveModel {}
