//! Create `task` table.
//! One row per compression job; written by the compressor, read and deleted here.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(uuid(Task::Id).primary_key())
                    .col(string_len(Task::Kind, 32).not_null())
                    .col(string_len(Task::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Task::CreatedAt).not_null())
                    .col(json_binary(Task::Params).not_null())
                    .col(string_null(Task::ResultFilename))
                    .col(uuid_null(Task::ResultFileId))
                    .col(string_len_null(Task::IpAddress, 64))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Task::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    Kind,
    Status,
    CreatedAt,
    Params,
    ResultFilename,
    ResultFileId,
    IpAddress,
}
