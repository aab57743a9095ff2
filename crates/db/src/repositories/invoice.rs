//! Invoice repository.
//!
//! Status changes are planned by the invoice service; this repository
//! applies the plan, posts the resulting entries, and saves the new amounts
//! in one transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry, changes_detail, diff_fields};
use tally_core::invoice::{
    InvoiceAmounts, InvoiceService, InvoiceSnapshot, InvoiceStatus, InvoiceUpdate,
    InvoiceUpdatePlan,
};
use tally_core::ledger::numbering::INVOICE_PREFIX;
use tally_core::ledger::{format_invoice_number, next_sequence};
use tally_core::posting::PostingService;
use tally_shared::types::money::{check_range, to_minor_units};
use tally_shared::types::{AccountId, InvoiceId, OrganizationId, PageRequest};

use super::account;
use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use super::posting::PostingRepository;
use super::tax::TaxRepository;
use crate::begin_serializable;
use crate::entities::invoices;

const ENTITY: &str = "Invoice";

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Invoice number; the next `INV-` number when absent.
    pub invoice_number: Option<String>,
    /// Customer name.
    pub customer: String,
    /// Issue date; the issuing entry is posted on it.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Tax rate code; the configured default when absent.
    pub tax_code: Option<String>,
    /// Income account; `Sales` when absent.
    pub income_account: Option<AccountId>,
    /// Draft (default) or Sent.
    pub status: Option<InvoiceStatus>,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Only invoices in this status.
    pub status: Option<InvoiceStatus>,
    /// Customer name contains.
    pub customer: Option<String>,
    /// Issued on or after.
    pub from: Option<NaiveDate>,
    /// Issued on or before.
    pub to: Option<NaiveDate>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    default_tax_code: Option<String>,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            default_tax_code: None,
        }
    }

    /// Applies this tax code to invoices created without one.
    #[must_use]
    pub fn with_default_tax_code(mut self, code: Option<String>) -> Self {
        self.default_tax_code = code;
        self
    }

    /// Lists invoices, newest issue date first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<(Vec<invoices::Model>, u64), RepositoryError> {
        let mut query = invoices::Entity::find()
            .filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }
        if let Some(customer) = filter.customer.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.filter(invoices::Column::Customer.contains(customer.trim()));
        }
        if let Some(from) = filter.from {
            query = query.filter(invoices::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(invoices::Column::IssueDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(invoices::Column::IssueDate)
            .order_by_desc(invoices::Column::InvoiceNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Gets an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        invoice_id: InvoiceId,
    ) -> Result<invoices::Model, RepositoryError> {
        find(&self.db, organization_id, invoice_id).await
    }

    /// Creates an invoice; a Sent invoice posts its issuing entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, a tax rate error, `InvalidInitialStatus`,
    /// `Conflict` for a taken number, a posting error, or a database error.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateInvoiceInput,
    ) -> Result<invoices::Model, RepositoryError> {
        let customer = input.customer.trim().to_string();
        if customer.is_empty() {
            return Err(RepositoryError::Validation("customer is required".to_string()));
        }
        if input.due_date < input.issue_date {
            return Err(RepositoryError::Validation(
                "due date cannot precede the issue date".to_string(),
            ));
        }
        let status = InvoiceService::initial_status(input.status)?;

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;

        if let Some(income_account) = input.income_account {
            account::find(&txn, organization_id, income_account).await?;
        }

        check_range(input.subtotal)?;
        let (tax_code, tax) = match input.tax_code.or_else(|| self.default_tax_code.clone()) {
            Some(code) => {
                let rate = TaxRepository::find_active_rate(&txn, organization_id, &code).await?;
                let tax = rate.tax_on(input.subtotal);
                (Some(rate.code), tax)
            }
            None => (None, Decimal::ZERO),
        };

        let invoice_number = match input.invoice_number.map(|n| n.trim().to_string()) {
            Some(number) if !number.is_empty() => number,
            _ => next_invoice_number(&txn, organization_id).await?,
        };

        let snapshot = InvoiceSnapshot {
            id: InvoiceId::new(),
            invoice_number,
            customer,
            issue_date: input.issue_date,
            due_date: input.due_date,
            status,
            amounts: InvoiceAmounts::issue(input.subtotal, tax),
            income_account: input.income_account,
        };
        let events = InvoiceService::plan_create(&snapshot)?;

        let now = Utc::now().into();
        let amounts = &snapshot.amounts;
        let invoice = invoices::ActiveModel {
            id: Set(snapshot.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            invoice_number: Set(snapshot.invoice_number.clone()),
            customer: Set(snapshot.customer.clone()),
            issue_date: Set(snapshot.issue_date),
            due_date: Set(snapshot.due_date),
            subtotal_minor: Set(to_minor_units(amounts.subtotal)?),
            tax_code: Set(tax_code),
            tax_minor: Set(to_minor_units(amounts.tax)?),
            total_minor: Set(to_minor_units(amounts.total)?),
            amount_paid_minor: Set(0),
            amount_deposited_minor: Set(0),
            amount_due_minor: Set(to_minor_units(amounts.amount_due)?),
            income_account_id: Set(snapshot.income_account.map(AccountId::into_inner)),
            status: Set(status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            RepositoryError::from_insert(
                e,
                format!("invoice number '{}' already exists", snapshot.invoice_number),
            )
        })?;

        for event in &events {
            let plan = PostingService::plan(event)?;
            PostingRepository::post_in_txn(&txn, organization_id, actor, &plan).await?;
        }

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::Invoice,
                invoice.id,
                json!({
                    "invoiceNumber": invoice.invoice_number,
                    "customer": invoice.customer,
                    "status": invoice.status,
                    "total": amounts.total,
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            invoice_number = %invoice.invoice_number,
            status = %invoice.status,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Applies a status change and/or amount edit.
    ///
    /// An update that changes nothing and posts nothing is rolled back and
    /// leaves no audit entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, any invoice transition error, a posting error, or
    /// a database error.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        invoice_id: InvoiceId,
        update: InvoiceUpdate,
    ) -> Result<invoices::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, invoice_id).await?;
        let before = describe(&existing);

        let (updated, plan) = Self::update_in_txn(
            &txn,
            organization_id,
            actor,
            existing.clone(),
            &update,
            Utc::now().date_naive(),
        )
        .await?;

        let changes = diff_fields(&before, &describe(&updated));
        if changes.is_empty() && plan.postings.is_empty() && !plan.reverse_postings {
            txn.rollback().await?;
            return Ok(existing);
        }

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                plan.action,
                EntityType::Invoice,
                updated.id,
                changes_detail(&changes),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            invoice_number = %updated.invoice_number,
            status = %updated.status,
            "Invoice updated"
        );
        Ok(updated)
    }

    /// Plans and applies an update inside an open transaction without
    /// writing an audit entry.
    ///
    /// # Errors
    ///
    /// Returns any invoice transition error, a posting error, or a database
    /// error.
    pub async fn update_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        existing: invoices::Model,
        update: &InvoiceUpdate,
        today: NaiveDate,
    ) -> Result<(invoices::Model, InvoiceUpdatePlan), RepositoryError> {
        let snapshot = existing.snapshot()?;
        let plan = InvoiceService::plan_update(&snapshot, update, today)?;

        if plan.reverse_postings {
            PostingRepository::reverse_source_in_txn(
                txn,
                organization_id,
                actor,
                existing.id,
                Some(update.effective_date.unwrap_or(today)),
                &format!("Invoice {} voided", existing.invoice_number),
            )
            .await?;
        }

        for event in &plan.postings {
            let posting = PostingService::plan(event)?;
            PostingRepository::post_in_txn(txn, organization_id, actor, &posting).await?;
        }

        let amounts = plan.amounts;
        let mut active: invoices::ActiveModel = existing.into();
        active.status = Set(plan.status.as_str().to_string());
        active.subtotal_minor = Set(to_minor_units(amounts.subtotal)?);
        active.tax_minor = Set(to_minor_units(amounts.tax)?);
        active.total_minor = Set(to_minor_units(amounts.total)?);
        active.amount_paid_minor = Set(to_minor_units(amounts.amount_paid)?);
        active.amount_deposited_minor = Set(to_minor_units(amounts.amount_deposited)?);
        active.amount_due_minor = Set(to_minor_units(amounts.amount_due)?);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(txn).await?;

        Ok((updated, plan))
    }
}

/// Loads an invoice of the organization.
pub(crate) async fn find<C: sea_orm::ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    invoice_id: InvoiceId,
) -> Result<invoices::Model, RepositoryError> {
    invoices::Entity::find_by_id(invoice_id.into_inner())
        .filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, invoice_id))
}

async fn next_invoice_number(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<String, RepositoryError> {
    let numbers: Vec<String> = invoices::Entity::find()
        .select_only()
        .column(invoices::Column::InvoiceNumber)
        .filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()))
        .into_tuple()
        .all(txn)
        .await?;
    let sequence = next_sequence(numbers.iter().map(String::as_str), INVOICE_PREFIX, 1);
    Ok(format_invoice_number(sequence))
}

fn describe(invoice: &invoices::Model) -> serde_json::Value {
    let amounts = invoice.amounts();
    json!({
        "status": invoice.status,
        "subtotal": amounts.subtotal,
        "tax": amounts.tax,
        "total": amounts.total,
        "amountPaid": amounts.amount_paid,
        "amountDeposited": amounts.amount_deposited,
        "amountDue": amounts.amount_due,
    })
}
