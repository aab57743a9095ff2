//! Expense, cheque and bill repository.
//!
//! Posted amounts are never edited in place: an update reverses the
//! original entry and posts a replacement.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry, changes_detail, diff_fields};
use tally_core::expense::{ExpenseDraft, ExpenseService, ExpenseType};
use tally_core::posting::PostingService;
use tally_shared::types::money::{check_range, from_minor_units, to_minor_units};
use tally_shared::types::{AccountId, ExpenseId, OrganizationId, PageRequest};
use uuid::Uuid;

use super::account;
use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use super::posting::{PostedJournal, PostingRepository};
use super::tax::TaxRepository;
use crate::begin_serializable;
use crate::entities::expenses;

const ENTITY: &str = "Expense";

/// Input for recording an expense, cheque or bill.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Kind of expense.
    pub expense_type: ExpenseType,
    /// Payee or supplier.
    pub payee: String,
    /// Expense date.
    pub date: NaiveDate,
    /// Account debited.
    pub expense_account: AccountId,
    /// Bank or card account credited; not used for bills.
    pub payment_account: Option<AccountId>,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Tax rate code; the configured default when absent.
    pub tax_code: Option<String>,
}

/// Input for editing an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New payee.
    pub payee: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New expense account.
    pub expense_account: Option<AccountId>,
    /// New payment account.
    pub payment_account: Option<AccountId>,
    /// New subtotal; tax is recomputed.
    pub subtotal: Option<Decimal>,
    /// New tax rate code; tax is recomputed.
    pub tax_code: Option<String>,
}

/// Filter options for listing expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only this kind.
    pub expense_type: Option<ExpenseType>,
    /// Payee contains.
    pub payee: Option<String>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
    /// Only paid (true) or unpaid (false).
    pub is_paid: Option<bool>,
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
    default_tax_code: Option<String>,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            default_tax_code: None,
        }
    }

    /// Applies this tax code to expenses recorded without one.
    #[must_use]
    pub fn with_default_tax_code(mut self, code: Option<String>) -> Self {
        self.default_tax_code = code;
        self
    }

    /// Lists expenses, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        filter: &ExpenseFilter,
        page: &PageRequest,
    ) -> Result<(Vec<expenses::Model>, u64), RepositoryError> {
        let mut query = expenses::Entity::find()
            .filter(expenses::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(expense_type) = filter.expense_type {
            query = query.filter(expenses::Column::ExpenseType.eq(expense_type.as_str()));
        }
        if let Some(payee) = filter.payee.as_deref().filter(|p| !p.trim().is_empty()) {
            query = query.filter(expenses::Column::Payee.contains(payee.trim()));
        }
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::ExpenseDate.lte(to));
        }
        if let Some(is_paid) = filter.is_paid {
            query = query.filter(expenses::Column::IsPaid.eq(is_paid));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Gets an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        expense_id: ExpenseId,
    ) -> Result<expenses::Model, RepositoryError> {
        find(&self.db, organization_id, expense_id).await
    }

    /// Records an expense and posts it.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `MissingPaymentAccount`, a tax rate error, a
    /// posting error, or a database error.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateExpenseInput,
    ) -> Result<expenses::Model, RepositoryError> {
        let payee = clean_payee(&input.payee)?;

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;

        let tax_code = input.tax_code.or_else(|| self.default_tax_code.clone());
        let (tax_code, tax) = tax_for(&txn, organization_id, tax_code, input.subtotal).await?;

        let draft = ExpenseDraft {
            id: ExpenseId::new(),
            expense_type: input.expense_type,
            payee,
            date: input.date,
            expense_account: input.expense_account,
            payment_account: match input.expense_type {
                ExpenseType::Bill => None,
                _ => input.payment_account,
            },
            subtotal: input.subtotal,
            tax,
        };
        let posted = post_draft(&txn, organization_id, actor, &draft).await?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(draft.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            expense_type: Set(draft.expense_type.as_str().to_string()),
            payee: Set(draft.payee.clone()),
            expense_date: Set(draft.date),
            expense_account_id: Set(draft.expense_account.into_inner()),
            payment_account_id: Set(draft.payment_account.map(AccountId::into_inner)),
            subtotal_minor: Set(to_minor_units(draft.subtotal)?),
            tax_code: Set(tax_code),
            tax_minor: Set(to_minor_units(draft.tax)?),
            total_minor: Set(to_minor_units(draft.total())?),
            journal_entry_id: Set(Some(posted.entry.id)),
            is_paid: Set(draft.expense_type.is_paid_on_record()),
            payment_entry_id: Set(None),
            matched_transaction_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::Expense,
                expense.id,
                json!({
                    "expenseType": expense.expense_type,
                    "payee": expense.payee,
                    "total": draft.total(),
                    "entryNumber": posted.entry.entry_number,
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            expense_id = %expense.id,
            expense_type = %expense.expense_type,
            "Expense recorded"
        );
        Ok(expense)
    }

    /// Edits an expense by reversing its entry and posting a replacement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `BillAlreadyPaid`, `Validation`, a tax rate error,
    /// a posting error, or a database error.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        expense_id: ExpenseId,
        input: UpdateExpenseInput,
    ) -> Result<expenses::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, expense_id).await?;
        let mut draft = existing.draft()?;
        ExpenseService::ensure_editable(&draft, existing.is_paid)?;
        let before = describe(&existing);

        if let Some(payee) = &input.payee {
            draft.payee = clean_payee(payee)?;
        }
        if let Some(date) = input.date {
            draft.date = date;
        }
        if let Some(expense_account) = input.expense_account {
            draft.expense_account = expense_account;
        }
        if let Some(payment_account) = input.payment_account
            && draft.expense_type != ExpenseType::Bill
        {
            draft.payment_account = Some(payment_account);
        }
        let tax_code = input.tax_code.or_else(|| existing.tax_code.clone());
        if let Some(subtotal) = input.subtotal {
            draft.subtotal = subtotal;
        }
        let (tax_code, tax) = tax_for(&txn, organization_id, tax_code, draft.subtotal).await?;
        draft.tax = tax;

        if let Some(entry_id) = existing.journal_entry_id {
            PostingRepository::reverse_in_txn(
                &txn,
                organization_id,
                actor,
                entry_id,
                None,
                "Expense updated",
            )
            .await?;
        }
        let posted = post_draft(&txn, organization_id, actor, &draft).await?;

        let mut active: expenses::ActiveModel = existing.into();
        active.payee = Set(draft.payee.clone());
        active.expense_date = Set(draft.date);
        active.expense_account_id = Set(draft.expense_account.into_inner());
        active.payment_account_id = Set(draft.payment_account.map(AccountId::into_inner));
        active.subtotal_minor = Set(to_minor_units(draft.subtotal)?);
        active.tax_code = Set(tax_code);
        active.tax_minor = Set(to_minor_units(draft.tax)?);
        active.total_minor = Set(to_minor_units(draft.total())?);
        active.journal_entry_id = Set(Some(posted.entry.id));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Update,
                EntityType::Expense,
                updated.id,
                changes_detail(&diff_fields(&before, &describe(&updated))),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Pays a bill from a bank or card account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotABill`, `BillAlreadyPaid`, a posting error, or
    /// a database error.
    pub async fn pay_bill(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        expense_id: ExpenseId,
        payment_account: AccountId,
        date: NaiveDate,
    ) -> Result<expenses::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, expense_id).await?;

        let (paid, posted) =
            Self::pay_bill_in_txn(&txn, organization_id, actor, existing, payment_account, date)
                .await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Payment,
                EntityType::Expense,
                paid.id,
                json!({
                    "paymentAccountId": payment_account,
                    "amount": paid.draft()?.total(),
                    "entryNumber": posted.entry.entry_number,
                }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(paid)
    }

    /// Posts a bill payment inside an open transaction without writing an
    /// audit entry.
    ///
    /// # Errors
    ///
    /// Returns `NotABill`, `BillAlreadyPaid`, a posting error, or a database
    /// error.
    pub async fn pay_bill_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        existing: expenses::Model,
        payment_account: AccountId,
        date: NaiveDate,
    ) -> Result<(expenses::Model, PostedJournal), RepositoryError> {
        let draft = existing.draft()?;
        let event = ExpenseService::payment_event(&draft, existing.is_paid, payment_account, date)?;
        let plan = PostingService::plan(&event)?;
        let posted = PostingRepository::post_in_txn(txn, organization_id, actor, &plan).await?;

        let mut active: expenses::ActiveModel = existing.into();
        active.is_paid = Set(true);
        active.payment_account_id = Set(Some(payment_account.into_inner()));
        active.payment_entry_id = Set(Some(posted.entry.id));
        active.updated_at = Set(Utc::now().into());
        let paid = active.update(txn).await?;

        Ok((paid, posted))
    }

    /// Links an expense to the bank transaction that settled it.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn link_transaction_in_txn(
        txn: &DatabaseTransaction,
        existing: expenses::Model,
        transaction_id: Uuid,
    ) -> Result<expenses::Model, RepositoryError> {
        let mut active: expenses::ActiveModel = existing.into();
        active.matched_transaction_id = Set(Some(transaction_id));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(txn).await?)
    }
}

/// Loads an expense of the organization.
pub(crate) async fn find<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    expense_id: ExpenseId,
) -> Result<expenses::Model, RepositoryError> {
    expenses::Entity::find_by_id(expense_id.into_inner())
        .filter(expenses::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, expense_id))
}

async fn post_draft(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: &str,
    draft: &ExpenseDraft,
) -> Result<PostedJournal, RepositoryError> {
    account::find(txn, organization_id, draft.expense_account).await?;
    let event = ExpenseService::posting_event(draft)?;
    let plan = PostingService::plan(&event)?;
    PostingRepository::post_in_txn(txn, organization_id, actor, &plan).await
}

async fn tax_for(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    code: Option<String>,
    subtotal: Decimal,
) -> Result<(Option<String>, Decimal), RepositoryError> {
    check_range(subtotal)?;
    match code {
        Some(code) => {
            let rate = TaxRepository::find_active_rate(txn, organization_id, &code).await?;
            let tax = rate.tax_on(subtotal);
            Ok((Some(rate.code), tax))
        }
        None => Ok((None, Decimal::ZERO)),
    }
}

fn clean_payee(payee: &str) -> Result<String, RepositoryError> {
    let payee = payee.trim();
    if payee.is_empty() {
        return Err(RepositoryError::Validation("payee is required".to_string()));
    }
    Ok(payee.to_string())
}

fn describe(expense: &expenses::Model) -> serde_json::Value {
    json!({
        "payee": expense.payee,
        "date": expense.expense_date,
        "expenseAccountId": expense.expense_account_id,
        "paymentAccountId": expense.payment_account_id,
        "subtotal": from_minor_units(expense.subtotal_minor),
        "tax": from_minor_units(expense.tax_minor),
        "taxCode": expense.tax_code,
    })
}
