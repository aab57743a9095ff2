//! Report repository.
//!
//! Loads the organization's chart and posted lines and hands them to the
//! report generator. Nothing is cached; every call reads committed data.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tally_core::expense::ExpenseType;
use tally_core::invoice::InvoiceStatus;
use tally_core::ledger::{AccountInfo, PostedLine};
use tally_core::reports::{
    AgingReport, BalanceSheet, GeneralLedger, LedgerActivity, MonthlyBalanceSheet, MonthlyPnl,
    OpenItem, PartyBalance, ProfitAndLoss, ReportService, TrialBalance,
};
use tally_core::tax::TaxSummary;
use tally_shared::types::money::from_minor_units;
use tally_shared::types::{AccountId, OrganizationId};
use uuid::Uuid;

use super::account;
use super::error::RepositoryError;
use super::organization::require;
use crate::entities::{accounts, expenses, invoices, journal_entries, journal_lines};

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Profit and loss between two dates, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a database error.
    pub async fn profit_and_loss(
        &self,
        organization_id: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProfitAndLoss, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::profit_and_loss(&accounts, &lines, start, end)?)
    }

    /// Profit and loss per calendar month of a year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYear` or a database error.
    pub async fn monthly_profit_and_loss(
        &self,
        organization_id: OrganizationId,
        year: i32,
    ) -> Result<MonthlyPnl, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::monthly_profit_and_loss(&accounts, &lines, year)?)
    }

    /// Balance sheet as of a date.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn balance_sheet(
        &self,
        organization_id: OrganizationId,
        as_of: NaiveDate,
    ) -> Result<BalanceSheet, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::balance_sheet(&accounts, &lines, as_of))
    }

    /// Balance sheet totals at the end of every month of a year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYear` or a database error.
    pub async fn monthly_balance_sheet(
        &self,
        organization_id: OrganizationId,
        year: i32,
    ) -> Result<MonthlyBalanceSheet, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::monthly_balance_sheet(&accounts, &lines, year)?)
    }

    /// Trial balance as of a date.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn trial_balance(
        &self,
        organization_id: OrganizationId,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::trial_balance(&accounts, &lines, as_of))
    }

    /// Sales tax collected and paid between two dates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a database error.
    pub async fn tax_summary(
        &self,
        organization_id: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaxSummary, RepositoryError> {
        let (accounts, lines) = self.books(organization_id).await?;
        Ok(ReportService::tax_summary(&accounts, &lines, start, end)?)
    }

    /// General ledger between two dates, for every account or just one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account, `InvalidDateRange`, or a
    /// database error.
    pub async fn general_ledger(
        &self,
        organization_id: OrganizationId,
        start: NaiveDate,
        end: NaiveDate,
        account_id: Option<AccountId>,
    ) -> Result<GeneralLedger, RepositoryError> {
        require(&self.db, organization_id).await?;
        if let Some(account_id) = account_id {
            account::find(&self.db, organization_id, account_id).await?;
        }
        let (accounts, _) = load_books(&self.db, organization_id).await?;
        let activity = load_activity(&self.db, organization_id).await?;
        Ok(ReportService::general_ledger(&accounts, &activity, start, end, account_id)?)
    }

    /// Unpaid invoices grouped by days past due.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn aging_receivable(
        &self,
        organization_id: OrganizationId,
        as_of: NaiveDate,
    ) -> Result<AgingReport, RepositoryError> {
        require(&self.db, organization_id).await?;
        let items = receivables(&self.db, organization_id).await?;
        Ok(ReportService::aging(&items, as_of))
    }

    /// Unpaid bills grouped by days past their bill date.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn aging_payable(
        &self,
        organization_id: OrganizationId,
        as_of: NaiveDate,
    ) -> Result<AgingReport, RepositoryError> {
        require(&self.db, organization_id).await?;
        let items = payables(&self.db, organization_id).await?;
        Ok(ReportService::aging(&items, as_of))
    }

    /// Amount due per customer over issued invoices.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn customer_balances(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<PartyBalance>, RepositoryError> {
        require(&self.db, organization_id).await?;
        let items = receivables(&self.db, organization_id).await?;
        Ok(ReportService::party_balances(&items))
    }

    /// Amount owed per supplier over bills.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn supplier_balances(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<PartyBalance>, RepositoryError> {
        require(&self.db, organization_id).await?;
        let items = payables(&self.db, organization_id).await?;
        Ok(ReportService::party_balances(&items))
    }

    async fn books(
        &self,
        organization_id: OrganizationId,
    ) -> Result<(Vec<AccountInfo>, Vec<PostedLine>), RepositoryError> {
        require(&self.db, organization_id).await?;
        load_books(&self.db, organization_id).await
    }
}

/// Loads every account and every posted line of an organization.
pub(crate) async fn load_books<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<(Vec<AccountInfo>, Vec<PostedLine>), RepositoryError> {
    let org = organization_id.into_inner();

    let accounts = accounts::Entity::find()
        .filter(accounts::Column::OrganizationId.eq(org))
        .all(conn)
        .await?
        .iter()
        .map(accounts::Model::info)
        .collect::<Result<Vec<_>, _>>()?;

    let dates: HashMap<Uuid, NaiveDate> = journal_entries::Entity::find()
        .select_only()
        .column(journal_entries::Column::Id)
        .column(journal_entries::Column::EntryDate)
        .filter(journal_entries::Column::OrganizationId.eq(org))
        .into_tuple::<(Uuid, NaiveDate)>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::OrganizationId.eq(org))
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|line| {
            dates.get(&line.entry_id).map(|date| PostedLine {
                account_id: line.account_id.into(),
                entry_date: *date,
                debit: line.debit(),
                credit: line.credit(),
            })
        })
        .collect();

    Ok((accounts, lines))
}

/// Loads every posted line with its entry, in posting order.
async fn load_activity<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<LedgerActivity>, RepositoryError> {
    let org = organization_id.into_inner();

    let entries = journal_entries::Entity::find()
        .filter(journal_entries::Column::OrganizationId.eq(org))
        .order_by_asc(journal_entries::Column::CreatedAt)
        .order_by_asc(journal_entries::Column::EntryNumber)
        .all(conn)
        .await?;
    let position: HashMap<Uuid, (usize, &journal_entries::Model)> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.id, (i, entry)))
        .collect();

    let mut lines: Vec<(usize, i32, LedgerActivity)> = journal_lines::Entity::find()
        .filter(journal_lines::Column::OrganizationId.eq(org))
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|line| {
            let (index, entry) = position.get(&line.entry_id)?;
            let activity = LedgerActivity {
                line: PostedLine {
                    account_id: line.account_id.into(),
                    entry_date: entry.entry_date,
                    debit: line.debit(),
                    credit: line.credit(),
                },
                entry_id: entry.id.into(),
                entry_number: entry.entry_number.clone(),
                memo: entry.memo.clone(),
            };
            Some((*index, line.sort_order, activity))
        })
        .collect();

    lines.sort_by_key(|(index, sort_order, _)| (*index, *sort_order));
    Ok(lines.into_iter().map(|(_, _, activity)| activity).collect())
}

/// Issued, unvoided invoices; paid ones carry a zero amount due.
async fn receivables<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<OpenItem>, RepositoryError> {
    let rows = invoices::Entity::find()
        .filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(
            invoices::Column::Status
                .is_not_in([InvoiceStatus::Draft.as_str(), InvoiceStatus::Voided.as_str()]),
        )
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|invoice| OpenItem {
            id: invoice.id,
            party: invoice.customer,
            reference: invoice.invoice_number,
            due_date: invoice.due_date,
            amount_due: from_minor_units(invoice.amount_due_minor),
        })
        .collect())
}

/// Bills, aged from their bill date; paid ones carry a zero amount due.
async fn payables<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<OpenItem>, RepositoryError> {
    let rows = expenses::Entity::find()
        .filter(expenses::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(expenses::Column::ExpenseType.eq(ExpenseType::Bill.as_str()))
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|bill| OpenItem {
            id: bill.id,
            reference: format!("Bill {}", bill.expense_date),
            party: bill.payee,
            due_date: bill.expense_date,
            amount_due: if bill.is_paid {
                Decimal::ZERO
            } else {
                from_minor_units(bill.total_minor)
            },
        })
        .collect())
}
