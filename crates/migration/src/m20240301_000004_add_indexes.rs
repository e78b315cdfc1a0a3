use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Task: recent-activity and completed-file listings sort by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_task_created_at")
                    .table(Task::Table)
                    .col(Task::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Task: statistics and file listing filter on (kind, status)
        manager
            .create_index(
                Index::create()
                    .name("idx_task_kind_status")
                    .table(Task::Table)
                    .col(Task::Kind)
                    .col(Task::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_result_file")
                    .table(Task::Table)
                    .col(Task::ResultFileId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_task_created_at").table(Task::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_task_kind_status").table(Task::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_task_result_file").table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Task { Table, Kind, Status, CreatedAt, ResultFileId }
