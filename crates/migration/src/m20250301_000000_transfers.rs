//! Transfer records and per-caller idempotency keys.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    CreatedBy,
    IdempotencyKey,
    SenderAccountId,
    RecipientAccountId,
    RecipientEmail,
    AmountMinor,
    Currency,
    Category,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Transfers::IdempotencyKey).string())
                    .col(
                        ColumnDef::new(Transfers::SenderAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::RecipientAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::RecipientEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::Currency).string().not_null())
                    .col(ColumnDef::new(Transfers::Category).string().not_null())
                    .col(ColumnDef::new(Transfers::Description).string())
                    .col(ColumnDef::new(Transfers::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-sender_account_id")
                            .from(Transfers::Table, Transfers::SenderAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-recipient_account_id")
                            .from(Transfers::Table, Transfers::RecipientAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-transfers-created_by-idempotency_key")
                    .table(Transfers::Table)
                    .col(Transfers::CreatedBy)
                    .col(Transfers::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-transfers-created_by-idempotency_key")
                    .table(Transfers::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;

        Ok(())
    }
}
