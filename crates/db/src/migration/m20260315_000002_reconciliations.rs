//! Migration to create the `reconciliations` table and link bank
//! transactions to the session that cleared them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reconciliations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reconciliations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Reconciliations::StartDate).date().not_null())
                    .col(ColumnDef::new(Reconciliations::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::StatementBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Reconciliations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Reconciliations::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reconciliations_account")
                            .from(Reconciliations::Table, Reconciliations::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reconciliations_account")
                    .table(Reconciliations::Table)
                    .col(Reconciliations::OrganizationId)
                    .col(Reconciliations::AccountId)
                    .to_owned(),
            )
            .await?;

        // Session that cleared the line; null until reconciled
        manager
            .alter_table(
                Table::alter()
                    .table(BankTransactions::Table)
                    .add_column(ColumnDef::new(BankTransactions::ReconciliationId).uuid().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bank_transactions_reconciliation")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::ReconciliationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_bank_transactions_reconciliation")
                    .table(BankTransactions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(BankTransactions::Table)
                    .drop_column(BankTransactions::ReconciliationId)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(Reconciliations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Reconciliations {
    Table,
    Id,
    OrganizationId,
    AccountId,
    StartDate,
    EndDate,
    StatementBalanceMinor,
    Status,
    CompletedAt,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum BankTransactions {
    Table,
    ReconciliationId,
}
