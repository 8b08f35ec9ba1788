//! Migration: Create book_borrows table

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000004_create_books::Books;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookBorrows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookBorrows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookBorrows::BookId).big_integer().not_null())
                    .col(ColumnDef::new(BookBorrows::BorrowerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(BookBorrows::BorrowedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookBorrows::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookBorrows::ReturnDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BookBorrows::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(BookBorrows::Notes).text().null())
                    .col(ColumnDef::new(BookBorrows::ApprovedBy).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookBorrows::Table, BookBorrows::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookBorrows::Table, BookBorrows::BorrowerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookBorrows::Table, BookBorrows::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_book_borrows_book_borrower")
                    .table(BookBorrows::Table)
                    .col(BookBorrows::BookId)
                    .col(BookBorrows::BorrowerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_book_borrows_status")
                    .table(BookBorrows::Table)
                    .col(BookBorrows::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookBorrows::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum BookBorrows {
    Table,
    Id,
    #[iden = "book_id"]
    BookId,
    #[iden = "borrower_id"]
    BorrowerId,
    #[iden = "borrowed_date"]
    BorrowedDate,
    #[iden = "due_date"]
    DueDate,
    #[iden = "return_date"]
    ReturnDate,
    Status,
    Notes,
    #[iden = "approved_by"]
    ApprovedBy,
}
