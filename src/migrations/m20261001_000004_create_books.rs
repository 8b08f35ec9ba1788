//! Migration: Create books and book_files tables

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000003_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Books::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Books::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Books::Author).string_len(255).not_null())
                    .col(ColumnDef::new(Books::Description).text().null())
                    .col(ColumnDef::new(Books::CategoryId).big_integer().null())
                    .col(ColumnDef::new(Books::UploadedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Books::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Books::Table, Books::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Books::Table, Books::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookFiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookFiles::BookId).big_integer().not_null())
                    .col(ColumnDef::new(BookFiles::FileName).string().not_null())
                    .col(ColumnDef::new(BookFiles::StoredPath).string().not_null())
                    .col(ColumnDef::new(BookFiles::FileSize).big_integer().null())
                    .col(
                        ColumnDef::new(BookFiles::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookFiles::Table, BookFiles::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_books_created_at")
                    .table(Books::Table)
                    .col(Books::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookFiles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Books {
    Table,
    Id,
    Title,
    Author,
    Description,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "uploaded_by"]
    UploadedBy,
    #[iden = "created_at"]
    CreatedAt,
}

#[derive(Iden)]
pub enum BookFiles {
    Table,
    Id,
    #[iden = "book_id"]
    BookId,
    #[iden = "file_name"]
    FileName,
    #[iden = "stored_path"]
    StoredPath,
    #[iden = "file_size"]
    FileSize,
    #[iden = "uploaded_at"]
    UploadedAt,
}
