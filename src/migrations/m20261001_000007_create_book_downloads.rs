//! Migration: Create book_downloads table

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000004_create_books::BookFiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookDownloads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookDownloads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookDownloads::BookFileId).big_integer().not_null())
                    .col(ColumnDef::new(BookDownloads::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(BookDownloads::DownloadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BookDownloads::IpAddress).string().null())
                    .col(ColumnDef::new(BookDownloads::UserAgent).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookDownloads::Table, BookDownloads::BookFileId)
                            .to(BookFiles::Table, BookFiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookDownloads::Table, BookDownloads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_book_downloads_downloaded_at")
                    .table(BookDownloads::Table)
                    .col(BookDownloads::DownloadedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookDownloads::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum BookDownloads {
    Table,
    Id,
    #[iden = "book_file_id"]
    BookFileId,
    #[iden = "user_id"]
    UserId,
    #[iden = "downloaded_at"]
    DownloadedAt,
    #[iden = "ip_address"]
    IpAddress,
    #[iden = "user_agent"]
    UserAgent,
}
