//! Expense, cheque, and bill routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::expense::ExpenseType;
use tally_db::{
    entities::expenses,
    repositories::{CreateExpenseInput, ExpenseFilter, ExpenseRepository, UpdateExpenseInput},
};
use tally_shared::types::{
    AccountId, ExpenseId, OrganizationId, PageRequest, PageResponse, money::from_minor_units,
};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/expenses",
            get(list_expenses).post(create_expense),
        )
        .route(
            "/organizations/{org_id}/expenses/{expense_id}",
            get(get_expense).put(update_expense),
        )
        .route(
            "/organizations/{org_id}/expenses/{expense_id}/pay",
            post(pay_bill),
        )
}

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    /// Filter by kind.
    pub expense_type: Option<ExpenseType>,
    /// Payee substring.
    pub payee: Option<String>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
    /// Filter by paid flag.
    pub is_paid: Option<bool>,
}

/// Request body for recording an expense.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    /// `expense`, `cheque`, or `bill`.
    pub expense_type: ExpenseType,
    /// Who was paid.
    pub payee: String,
    /// Expense date.
    pub date: NaiveDate,
    /// Account charged.
    pub expense_account_id: AccountId,
    /// Bank or card paid from; ignored for bills.
    pub payment_account_id: Option<AccountId>,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Tax rate code.
    pub tax_code: Option<String>,
}

/// Request body for editing an expense.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    /// New payee.
    pub payee: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New expense account.
    pub expense_account_id: Option<AccountId>,
    /// New payment account.
    pub payment_account_id: Option<AccountId>,
    /// New subtotal.
    pub subtotal: Option<Decimal>,
    /// New tax rate code.
    pub tax_code: Option<String>,
}

/// Request body for paying a bill.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayBillRequest {
    /// Bank or card the bill is paid from.
    pub payment_account_id: AccountId,
    /// Payment date.
    pub date: NaiveDate,
}

/// Response for an expense.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Kind.
    pub expense_type: String,
    /// Payee.
    pub payee: String,
    /// Expense date.
    pub date: NaiveDate,
    /// Account charged.
    pub expense_account_id: Uuid,
    /// Account paid from.
    pub payment_account_id: Option<Uuid>,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Tax rate code.
    pub tax_code: Option<String>,
    /// Tax paid.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Whether the expense has been paid.
    pub is_paid: bool,
    /// Posting of the expense.
    pub journal_entry_id: Option<Uuid>,
    /// Posting of the bill payment.
    pub payment_entry_id: Option<Uuid>,
    /// Bank transaction matched to this expense.
    pub matched_transaction_id: Option<Uuid>,
}

impl From<expenses::Model> for ExpenseResponse {
    fn from(model: expenses::Model) -> Self {
        Self {
            id: model.id,
            expense_type: model.expense_type,
            payee: model.payee,
            date: model.expense_date,
            expense_account_id: model.expense_account_id,
            payment_account_id: model.payment_account_id,
            subtotal: from_minor_units(model.subtotal_minor),
            tax_code: model.tax_code,
            tax: from_minor_units(model.tax_minor),
            total: from_minor_units(model.total_minor),
            is_paid: model.is_paid,
            journal_entry_id: model.journal_entry_id,
            payment_entry_id: model.payment_entry_id,
            matched_transaction_id: model.matched_transaction_id,
        }
    }
}

fn repository(state: &AppState) -> ExpenseRepository {
    ExpenseRepository::new((*state.db).clone())
        .with_default_tax_code(state.ledger.default_tax_code.clone())
}

/// GET `/organizations/{org_id}/expenses`
async fn list_expenses(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListExpensesQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<ExpenseResponse>>> {
    let filter = ExpenseFilter {
        expense_type: query.expense_type,
        payee: query.payee,
        from: query.from,
        to: query.to,
        is_paid: query.is_paid,
    };
    let (expenses, total) = repository(&state).list(org_id, &filter, &page).await?;
    Ok(Json(PageResponse::new(
        expenses.into_iter().map(Into::into).collect(),
        page.page,
        page.per_page,
        total,
    )))
}

/// GET `/organizations/{org_id}/expenses/{expense_id}`
async fn get_expense(
    State(state): State<AppState>,
    Path((org_id, expense_id)): Path<(OrganizationId, ExpenseId)>,
) -> ApiResult<Json<ExpenseResponse>> {
    Ok(Json(repository(&state).get(org_id, expense_id).await?.into()))
}

/// POST `/organizations/{org_id}/expenses`
async fn create_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<ExpenseResponse>)> {
    let input = CreateExpenseInput {
        expense_type: payload.expense_type,
        payee: payload.payee,
        date: payload.date,
        expense_account: payload.expense_account_id,
        payment_account: payload.payment_account_id,
        subtotal: payload.subtotal,
        tax_code: payload.tax_code,
    };
    let expense = repository(&state).create(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

/// PUT `/organizations/{org_id}/expenses/{expense_id}` - Edit and repost.
async fn update_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, expense_id)): Path<(OrganizationId, ExpenseId)>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> ApiResult<Json<ExpenseResponse>> {
    let input = UpdateExpenseInput {
        payee: payload.payee,
        date: payload.date,
        expense_account: payload.expense_account_id,
        payment_account: payload.payment_account_id,
        subtotal: payload.subtotal,
        tax_code: payload.tax_code,
    };
    let expense = repository(&state)
        .update(org_id, actor.name(), expense_id, input)
        .await?;
    Ok(Json(expense.into()))
}

/// POST `/organizations/{org_id}/expenses/{expense_id}/pay` - Pay a bill.
async fn pay_bill(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, expense_id)): Path<(OrganizationId, ExpenseId)>,
    Json(payload): Json<PayBillRequest>,
) -> ApiResult<Json<ExpenseResponse>> {
    let expense = repository(&state)
        .pay_bill(
            org_id,
            actor.name(),
            expense_id,
            payload.payment_account_id,
            payload.date,
        )
        .await?;
    Ok(Json(expense.into()))
}
