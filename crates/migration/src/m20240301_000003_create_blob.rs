//! Create `blob_file` and `blob_chunk` tables.
//!
//! A blob is one metadata row plus `length / chunk_size` payload rows.
//! Chunks cascade with their metadata row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlobFile::Table)
                    .if_not_exists()
                    .col(uuid(BlobFile::Id).primary_key())
                    .col(string_null(BlobFile::Filename))
                    .col(big_integer(BlobFile::Length).not_null())
                    .col(integer(BlobFile::ChunkSize).not_null())
                    .col(timestamp_with_time_zone(BlobFile::UploadDate).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BlobChunk::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlobChunk::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(uuid(BlobChunk::FilesId).not_null())
                    .col(integer(BlobChunk::N).not_null())
                    .col(ColumnDef::new(BlobChunk::Data).binary().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blob_chunk_file")
                            .from(BlobChunk::Table, BlobChunk::FilesId)
                            .to(BlobFile::Table, BlobFile::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (file, chunk index)
        manager
            .create_index(
                Index::create()
                    .name("uniq_blob_chunk_file_n")
                    .table(BlobChunk::Table)
                    .col(BlobChunk::FilesId)
                    .col(BlobChunk::N)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(BlobChunk::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(BlobFile::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BlobFile { Table, Id, Filename, Length, ChunkSize, UploadDate }

#[derive(DeriveIden)]
enum BlobChunk { Table, Id, FilesId, N, Data }
