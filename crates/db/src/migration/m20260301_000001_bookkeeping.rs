//! Bookkeeping schema: organizations, chart of accounts, journal, invoices,
//! expenses, bank transactions and rules, tax, and the audit log.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== Organizations ==========
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(uuid_pk(Organizations::Id))
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(timestamp(Organizations::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // ========== Accounts ==========
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(uuid_pk(Accounts::Id))
                    .col(ColumnDef::new(Accounts::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::DetailType).string().null())
                    .col(minor(Accounts::BalanceMinor))
                    .col(ColumnDef::new(Accounts::BankBalanceMinor).big_integer().null())
                    .col(flag(Accounts::IsActive, true))
                    .col(flag(Accounts::IsSystem, false))
                    .col(timestamp(Accounts::CreatedAt))
                    .col(timestamp(Accounts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_organization")
                            .from(Accounts::Table, Accounts::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_org_name")
                    .table(Accounts::Table)
                    .col(Accounts::OrganizationId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== Journal ==========
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(uuid_pk(JournalEntries::Id))
                    .col(ColumnDef::new(JournalEntries::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryNumber).string().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Memo).text().not_null())
                    .col(ColumnDef::new(JournalEntries::Source).string().not_null())
                    .col(ColumnDef::new(JournalEntries::SourceId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::ReversesEntryId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::ReversedByEntryId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).string().not_null())
                    .col(timestamp(JournalEntries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_entries_organization")
                            .from(JournalEntries::Table, JournalEntries::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_org_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::OrganizationId)
                    .col(JournalEntries::EntryNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_source")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::OrganizationId)
                    .col(JournalEntries::SourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(uuid_pk(JournalLines::Id))
                    .col(ColumnDef::new(JournalLines::EntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::AccountId).uuid().not_null())
                    .col(minor(JournalLines::DebitMinor))
                    .col(minor(JournalLines::CreditMinor))
                    .col(ColumnDef::new(JournalLines::Memo).text().null())
                    .col(ColumnDef::new(JournalLines::SortOrder).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_entry")
                            .from(JournalLines::Table, JournalLines::EntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_account")
                            .from(JournalLines::Table, JournalLines::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_account")
                    .table(JournalLines::Table)
                    .col(JournalLines::AccountId)
                    .to_owned(),
            )
            .await?;

        // ========== Invoices & Expenses ==========
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(uuid_pk(Invoices::Id))
                    .col(ColumnDef::new(Invoices::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string().not_null())
                    .col(ColumnDef::new(Invoices::Customer).string().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date().not_null())
                    .col(minor(Invoices::SubtotalMinor))
                    .col(ColumnDef::new(Invoices::TaxCode).string().null())
                    .col(minor(Invoices::TaxMinor))
                    .col(minor(Invoices::TotalMinor))
                    .col(minor(Invoices::AmountPaidMinor))
                    .col(minor(Invoices::AmountDepositedMinor))
                    .col(minor(Invoices::AmountDueMinor))
                    .col(ColumnDef::new(Invoices::IncomeAccountId).uuid().null())
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(timestamp(Invoices::CreatedAt))
                    .col(timestamp(Invoices::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_organization")
                            .from(Invoices::Table, Invoices::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_org_number")
                    .table(Invoices::Table)
                    .col(Invoices::OrganizationId)
                    .col(Invoices::InvoiceNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(uuid_pk(Expenses::Id))
                    .col(ColumnDef::new(Expenses::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::ExpenseType).string().not_null())
                    .col(ColumnDef::new(Expenses::Payee).string().not_null())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::ExpenseAccountId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::PaymentAccountId).uuid().null())
                    .col(minor(Expenses::SubtotalMinor))
                    .col(ColumnDef::new(Expenses::TaxCode).string().null())
                    .col(minor(Expenses::TaxMinor))
                    .col(minor(Expenses::TotalMinor))
                    .col(ColumnDef::new(Expenses::JournalEntryId).uuid().null())
                    .col(flag(Expenses::IsPaid, false))
                    .col(ColumnDef::new(Expenses::PaymentEntryId).uuid().null())
                    .col(ColumnDef::new(Expenses::MatchedTransactionId).uuid().null())
                    .col(timestamp(Expenses::CreatedAt))
                    .col(timestamp(Expenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_organization")
                            .from(Expenses::Table, Expenses::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== Bank Transactions & Rules ==========
        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(uuid_pk(BankTransactions::Id))
                    .col(ColumnDef::new(BankTransactions::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(BankTransactions::AccountId).uuid().not_null())
                    .col(ColumnDef::new(BankTransactions::TxnDate).date().not_null())
                    .col(ColumnDef::new(BankTransactions::Description).string().not_null())
                    .col(minor(BankTransactions::AmountMinor))
                    .col(ColumnDef::new(BankTransactions::Status).string().not_null())
                    .col(ColumnDef::new(BankTransactions::CategoryAccountId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::Payee).string().null())
                    .col(ColumnDef::new(BankTransactions::Memo).text().null())
                    .col(ColumnDef::new(BankTransactions::RuleId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::JournalEntryId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::MatchedKind).string().null())
                    .col(ColumnDef::new(BankTransactions::MatchedId).uuid().null())
                    .col(timestamp(BankTransactions::CreatedAt))
                    .col(timestamp(BankTransactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bank_transactions_account")
                            .from(BankTransactions::Table, BankTransactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Deduplication key for statement imports
        manager
            .create_index(
                Index::create()
                    .name("idx_bank_transactions_dedup")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::AccountId)
                    .col(BankTransactions::TxnDate)
                    .col(BankTransactions::Description)
                    .col(BankTransactions::AmountMinor)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bank_transactions_org_status")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::OrganizationId)
                    .col(BankTransactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankRules::Table)
                    .if_not_exists()
                    .col(uuid_pk(BankRules::Id))
                    .col(ColumnDef::new(BankRules::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(BankRules::Name).string().not_null())
                    .col(ColumnDef::new(BankRules::Priority).integer().not_null().default(0))
                    .col(ColumnDef::new(BankRules::Conditions).text().not_null())
                    .col(ColumnDef::new(BankRules::AssignAccountId).uuid().null())
                    .col(ColumnDef::new(BankRules::AssignPayee).string().null())
                    .col(flag(BankRules::AutoConfirm, false))
                    .col(flag(BankRules::IsActive, true))
                    .col(timestamp(BankRules::CreatedAt))
                    .col(timestamp(BankRules::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bank_rules_organization")
                            .from(BankRules::Table, BankRules::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== Tax ==========
        manager
            .create_table(
                Table::create()
                    .table(TaxRates::Table)
                    .if_not_exists()
                    .col(uuid_pk(TaxRates::Id))
                    .col(ColumnDef::new(TaxRates::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(TaxRates::Code).string().not_null())
                    .col(ColumnDef::new(TaxRates::Name).string().not_null())
                    .col(ColumnDef::new(TaxRates::RateThousandths).big_integer().not_null())
                    .col(ColumnDef::new(TaxRates::Agency).string().not_null())
                    .col(flag(TaxRates::IsActive, true))
                    .col(timestamp(TaxRates::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tax_rates_organization")
                            .from(TaxRates::Table, TaxRates::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tax_rates_org_code")
                    .table(TaxRates::Table)
                    .col(TaxRates::OrganizationId)
                    .col(TaxRates::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaxFilings::Table)
                    .if_not_exists()
                    .col(uuid_pk(TaxFilings::Id))
                    .col(ColumnDef::new(TaxFilings::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(TaxFilings::Agency).string().not_null())
                    .col(ColumnDef::new(TaxFilings::PeriodStart).date().not_null())
                    .col(ColumnDef::new(TaxFilings::PeriodEnd).date().not_null())
                    .col(minor(TaxFilings::CollectedMinor))
                    .col(minor(TaxFilings::PaidMinor))
                    .col(minor(TaxFilings::AdjustmentMinor))
                    .col(minor(TaxFilings::NetTaxMinor))
                    .col(ColumnDef::new(TaxFilings::Status).string().not_null())
                    .col(timestamp(TaxFilings::CreatedAt))
                    .col(timestamp(TaxFilings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tax_filings_organization")
                            .from(TaxFilings::Table, TaxFilings::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== Audit Log ==========
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(uuid_pk(AuditLog::Id))
                    .col(ColumnDef::new(AuditLog::OrganizationId).uuid().not_null())
                    .col(timestamp(AuditLog::OccurredAt))
                    .col(ColumnDef::new(AuditLog::Actor).string().not_null())
                    .col(ColumnDef::new(AuditLog::Action).string().not_null())
                    .col(ColumnDef::new(AuditLog::EntityType).string().not_null())
                    .col(ColumnDef::new(AuditLog::EntityId).uuid().not_null())
                    .col(ColumnDef::new(AuditLog::Detail).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_org_time")
                    .table(AuditLog::Table)
                    .col(AuditLog::OrganizationId)
                    .col(AuditLog::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_entity")
                    .table(AuditLog::Table)
                    .col(AuditLog::EntityType)
                    .col(AuditLog::EntityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            AuditLog::Table.into_iden(),
            TaxFilings::Table.into_iden(),
            TaxRates::Table.into_iden(),
            BankRules::Table.into_iden(),
            BankTransactions::Table.into_iden(),
            Expenses::Table.into_iden(),
            Invoices::Table.into_iden(),
            JournalLines::Table.into_iden(),
            JournalEntries::Table.into_iden(),
            Accounts::Table.into_iden(),
            Organizations::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn uuid_pk<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).uuid().not_null().primary_key().to_owned()
}

fn minor<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).big_integer().not_null().default(0).to_owned()
}

fn flag<T: IntoIden>(name: T, default: bool) -> ColumnDef {
    ColumnDef::new(name).boolean().not_null().default(default).to_owned()
}

fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    OrganizationId,
    Name,
    AccountType,
    DetailType,
    BalanceMinor,
    BankBalanceMinor,
    IsActive,
    IsSystem,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    OrganizationId,
    EntryNumber,
    EntryDate,
    Memo,
    Source,
    SourceId,
    ReversesEntryId,
    ReversedByEntryId,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JournalLines {
    Table,
    Id,
    EntryId,
    OrganizationId,
    AccountId,
    DebitMinor,
    CreditMinor,
    Memo,
    SortOrder,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    OrganizationId,
    InvoiceNumber,
    Customer,
    IssueDate,
    DueDate,
    SubtotalMinor,
    TaxCode,
    TaxMinor,
    TotalMinor,
    AmountPaidMinor,
    AmountDepositedMinor,
    AmountDueMinor,
    IncomeAccountId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    OrganizationId,
    ExpenseType,
    Payee,
    ExpenseDate,
    ExpenseAccountId,
    PaymentAccountId,
    SubtotalMinor,
    TaxCode,
    TaxMinor,
    TotalMinor,
    JournalEntryId,
    IsPaid,
    PaymentEntryId,
    MatchedTransactionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BankTransactions {
    Table,
    Id,
    OrganizationId,
    AccountId,
    TxnDate,
    Description,
    AmountMinor,
    Status,
    CategoryAccountId,
    Payee,
    Memo,
    RuleId,
    JournalEntryId,
    MatchedKind,
    MatchedId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BankRules {
    Table,
    Id,
    OrganizationId,
    Name,
    Priority,
    Conditions,
    AssignAccountId,
    AssignPayee,
    AutoConfirm,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TaxRates {
    Table,
    Id,
    OrganizationId,
    Code,
    Name,
    RateThousandths,
    Agency,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TaxFilings {
    Table,
    Id,
    OrganizationId,
    Agency,
    PeriodStart,
    PeriodEnd,
    CollectedMinor,
    PaidMinor,
    AdjustmentMinor,
    NetTaxMinor,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    OrganizationId,
    OccurredAt,
    Actor,
    Action,
    EntityType,
    EntityId,
    Detail,
}
