//! Create role table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Role::Name).string_len(128).not_null().primary_key())
                    .col(ColumnDef::new(Role::DeskAccess).boolean().not_null().default(true))
                    .col(ColumnDef::new(Role::Disabled).boolean().not_null().default(false))
                    .col(ColumnDef::new(Role::IsCustom).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Role::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Role::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Role {
    Table,
    Name,
    DeskAccess,
    Disabled,
    IsCustom,
    CreatedAt,
}
