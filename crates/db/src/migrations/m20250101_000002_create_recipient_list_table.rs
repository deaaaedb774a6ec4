//! Create recipient_list_member table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecipientListMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecipientListMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecipientListMember::ListId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipientListMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipientListMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipient_list_member_user")
                            .from(RecipientListMember::Table, RecipientListMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (list_id, user_id) - one subscription per list
        manager
            .create_index(
                Index::create()
                    .name("idx_recipient_list_member_list_user")
                    .table(RecipientListMember::Table)
                    .col(RecipientListMember::ListId)
                    .col(RecipientListMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipientListMember::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RecipientListMember {
    Table,
    Id,
    ListId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
