//! Migration: Create book_reviews table

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
                    .table(BookReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookReviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookReviews::BookId).big_integer().not_null())
                    .col(ColumnDef::new(BookReviews::ReviewerId).big_integer().not_null())
                    .col(ColumnDef::new(BookReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(BookReviews::Comment).text().null())
                    .col(
                        ColumnDef::new(BookReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookReviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookReviews::Table, BookReviews::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookReviews::Table, BookReviews::ReviewerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One review per reader per book
        manager
            .create_index(
                Index::create()
                    .name("idx_book_reviews_book_reviewer")
                    .table(BookReviews::Table)
                    .col(BookReviews::BookId)
                    .col(BookReviews::ReviewerId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookReviews::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum BookReviews {
    Table,
    Id,
    #[iden = "book_id"]
    BookId,
    #[iden = "reviewer_id"]
    ReviewerId,
    Rating,
    Comment,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
