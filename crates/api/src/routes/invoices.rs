//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::invoice::{AmountEdit, InvoiceStatus, InvoiceUpdate};
use tally_db::{
    entities::invoices,
    repositories::{
        CreateInvoiceInput, InvoiceFilter, InvoiceRepository, RepositoryError, TaxRepository,
    },
};
use tally_shared::types::money::check_range;
use tally_shared::types::{AccountId, InvoiceId, OrganizationId, PageRequest, PageResponse};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/invoices",
            get(list_invoices).post(create_invoice),
        )
        .route(
            "/organizations/{org_id}/invoices/{invoice_id}",
            get(get_invoice).patch(update_invoice),
        )
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Filter by status.
    pub status: Option<InvoiceStatus>,
    /// Customer name substring.
    pub customer: Option<String>,
    /// Issued on or after.
    pub from: Option<NaiveDate>,
    /// Issued on or before.
    pub to: Option<NaiveDate>,
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Explicit number; the next `INV-NNNN` when absent.
    pub invoice_number: Option<String>,
    /// Customer name.
    pub customer: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Tax rate code; the configured default when absent.
    pub tax_code: Option<String>,
    /// Income account; `Sales` when absent.
    pub income_account_id: Option<AccountId>,
    /// Starting status, `draft` or `sent`.
    pub status: Option<InvoiceStatus>,
}

/// Request body for a status change or draft edit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    /// Target status.
    pub status: Option<InvoiceStatus>,
    /// Payment received, for `partial` or `paid`.
    pub payment_amount: Option<Decimal>,
    /// Bank account for `deposited`.
    pub deposit_account_id: Option<AccountId>,
    /// New subtotal of a draft; tax is recomputed at the invoice's rate.
    pub subtotal: Option<Decimal>,
    /// Date the change takes effect.
    pub effective_date: Option<NaiveDate>,
}

/// Response for an invoice.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Invoice number.
    pub invoice_number: String,
    /// Customer name.
    pub customer: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Status.
    pub status: String,
    /// Tax rate code.
    pub tax_code: Option<String>,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Sales tax.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Payments received.
    pub amount_paid: Decimal,
    /// Payments deposited to a bank.
    pub amount_deposited: Decimal,
    /// Still owed.
    pub amount_due: Decimal,
    /// Income account.
    pub income_account_id: Option<Uuid>,
}

impl From<invoices::Model> for InvoiceResponse {
    fn from(model: invoices::Model) -> Self {
        let amounts = model.amounts();
        Self {
            id: model.id,
            invoice_number: model.invoice_number,
            customer: model.customer,
            issue_date: model.issue_date,
            due_date: model.due_date,
            status: model.status,
            tax_code: model.tax_code,
            subtotal: amounts.subtotal,
            tax: amounts.tax,
            total: amounts.total,
            amount_paid: amounts.amount_paid,
            amount_deposited: amounts.amount_deposited,
            amount_due: amounts.amount_due,
            income_account_id: model.income_account_id,
        }
    }
}

fn repository(state: &AppState) -> InvoiceRepository {
    InvoiceRepository::new((*state.db).clone())
        .with_default_tax_code(state.ledger.default_tax_code.clone())
}

/// GET `/organizations/{org_id}/invoices`
async fn list_invoices(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListInvoicesQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<InvoiceResponse>>> {
    let filter = InvoiceFilter {
        status: query.status,
        customer: query.customer,
        from: query.from,
        to: query.to,
    };
    let (invoices, total) = repository(&state).list(org_id, &filter, &page).await?;
    Ok(Json(PageResponse::new(
        invoices.into_iter().map(Into::into).collect(),
        page.page,
        page.per_page,
        total,
    )))
}

/// GET `/organizations/{org_id}/invoices/{invoice_id}`
async fn get_invoice(
    State(state): State<AppState>,
    Path((org_id, invoice_id)): Path<(OrganizationId, InvoiceId)>,
) -> ApiResult<Json<InvoiceResponse>> {
    Ok(Json(repository(&state).get(org_id, invoice_id).await?.into()))
}

/// POST `/organizations/{org_id}/invoices` - Issue or draft an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceResponse>)> {
    let input = CreateInvoiceInput {
        invoice_number: payload.invoice_number,
        customer: payload.customer,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        subtotal: payload.subtotal,
        tax_code: payload.tax_code,
        income_account: payload.income_account_id,
        status: payload.status,
    };
    let invoice = repository(&state).create(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// PATCH `/organizations/{org_id}/invoices/{invoice_id}`
async fn update_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, invoice_id)): Path<(OrganizationId, InvoiceId)>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> ApiResult<Json<InvoiceResponse>> {
    let repo = repository(&state);

    let amounts = match payload.subtotal {
        Some(subtotal) => {
            check_range(subtotal).map_err(RepositoryError::from)?;
            let existing = repo.get(org_id, invoice_id).await?;
            let tax = match existing.tax_code.as_deref() {
                Some(code) => TaxRepository::find_active_rate(&*state.db, org_id, code)
                    .await?
                    .tax_on(subtotal),
                None => Decimal::ZERO,
            };
            Some(AmountEdit { subtotal, tax })
        }
        None => None,
    };

    let update = InvoiceUpdate {
        status: payload.status,
        payment_amount: payload.payment_amount,
        deposit_account: payload.deposit_account_id,
        amounts,
        effective_date: payload.effective_date,
    };
    let invoice = repo.update(org_id, actor.name(), invoice_id, update).await?;
    Ok(Json(invoice.into()))
}
