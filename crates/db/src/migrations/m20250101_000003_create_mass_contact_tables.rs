//! Create mass contact category and message archive tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MassContactCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MassContactCategory::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MassContactCategory::Label)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MassContactCategory::Selected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MassContactCategory::PermissionScope)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MassContactCategory::Recipients)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(MassContactCategory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MassContactMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MassContactMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MassContactMessage::Subject)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MassContactMessage::Body).text().not_null())
                    .col(
                        ColumnDef::new(MassContactMessage::Format)
                            .string_len(32)
                            .not_null()
                            .default("plain_text"),
                    )
                    .col(
                        ColumnDef::new(MassContactMessage::Categories)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(MassContactMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (archive listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_mass_contact_message_created_at")
                    .table(MassContactMessage::Table)
                    .col(MassContactMessage::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MassContactMessage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MassContactCategory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MassContactCategory {
    Table,
    Id,
    Label,
    Selected,
    PermissionScope,
    Recipients,
    CreatedAt,
}

#[derive(Iden)]
enum MassContactMessage {
    Table,
    Id,
    Subject,
    Body,
    Format,
    Categories,
    CreatedAt,
}
