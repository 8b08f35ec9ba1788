//! Migration: Create institutional_ids table

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstitutionalIds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstitutionalIds::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::InstitutionalId)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::AccountType)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::Status)
                            .string_len(10)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(InstitutionalIds::FirstName).string_len(30).null())
                    .col(ColumnDef::new(InstitutionalIds::LastName).string_len(30).null())
                    .col(ColumnDef::new(InstitutionalIds::Email).string().null())
                    .col(
                        ColumnDef::new(InstitutionalIds::AcademicLevel)
                            .string_len(20)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::Department)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InstitutionalIds::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(InstitutionalIds::UsedBy).big_integer().null())
                    .col(ColumnDef::new(InstitutionalIds::AddedBy).big_integer().null())
                    .col(ColumnDef::new(InstitutionalIds::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(InstitutionalIds::Table, InstitutionalIds::UsedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(InstitutionalIds::Table, InstitutionalIds::AddedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_institutional_ids_value", InstitutionalIds::InstitutionalId),
            ("idx_institutional_ids_status", InstitutionalIds::Status),
            ("idx_institutional_ids_account_type", InstitutionalIds::AccountType),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(InstitutionalIds::Table)
                        .col(col)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(InstitutionalIds::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum InstitutionalIds {
    Table,
    Id,
    #[iden = "institutional_id"]
    InstitutionalId,
    #[iden = "account_type"]
    AccountType,
    Status,
    #[iden = "first_name"]
    FirstName,
    #[iden = "last_name"]
    LastName,
    Email,
    #[iden = "academic_level"]
    AcademicLevel,
    Department,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "expires_at"]
    ExpiresAt,
    #[iden = "used_at"]
    UsedAt,
    #[iden = "used_by"]
    UsedBy,
    #[iden = "added_by"]
    AddedBy,
    Notes,
}
