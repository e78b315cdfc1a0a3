//! Create `holiday` table.
//!
//! Keyed by the `YYYYMMDD` identifier; attributes are a JSONB document.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Holiday::Table)
                    .if_not_exists()
                    .col(string_len(Holiday::Id, 32).primary_key())
                    .col(json_binary(Holiday::Attributes).not_null())
                    .col(timestamp_with_time_zone(Holiday::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Holiday::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Holiday { Table, Id, Attributes, UpdatedAt }
