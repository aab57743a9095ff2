//! Bank feed routes: statement import, review, rules, and matching.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::{
    BankTransactionStatus, ColumnDetection, ColumnMapping, DocumentKind, RawStatementRow,
};
use tally_db::{
    entities::bank_transactions,
    repositories::{
        AutoMatchSummary, BankTransactionFilter, BankTransactionRepository, ImportSummary,
        RuleRunSummary, StatusChangeInput,
    },
};
use tally_shared::types::{AccountId, BankTransactionId, OrganizationId, PageRequest, PageResponse};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the bank transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/bank-transactions",
            get(list_transactions),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/import",
            post(import_rows),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/import/preview",
            post(preview_csv),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/import/csv",
            post(import_csv),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/apply-rules",
            post(apply_rules),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/auto-match",
            post(auto_match),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/{transaction_id}",
            get(get_transaction),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/{transaction_id}/status",
            patch(set_status),
        )
        .route(
            "/organizations/{org_id}/bank-transactions/{transaction_id}/match",
            post(match_document),
        )
}

/// Query parameters for listing bank transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Bank or card account.
    pub account_id: Option<AccountId>,
    /// Review status.
    pub status: Option<BankTransactionStatus>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
}

/// Request body for importing pre-split rows.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Bank or card account the statement belongs to.
    pub account_id: AccountId,
    /// Statement rows.
    pub rows: Vec<RawStatementRow>,
}

/// Request body for detecting CSV columns.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// CSV text with a header row.
    pub csv: String,
}

/// Request body for importing a CSV statement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportRequest {
    /// Bank or card account the statement belongs to.
    pub account_id: AccountId,
    /// CSV text with a header row.
    pub csv: String,
    /// Confirmed column mapping.
    pub mapping: ColumnMapping,
}

/// Request body for a review decision.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    /// Target status.
    pub status: BankTransactionStatus,
    /// Category account for `categorized`; the suggested one when absent.
    pub category_account_id: Option<AccountId>,
    /// Payee.
    pub payee: Option<String>,
    /// Memo.
    pub memo: Option<String>,
}

/// Request body for running rules.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRulesRequest {
    /// Limit to one account; every account when absent.
    pub account_id: Option<AccountId>,
}

/// Request body for automatic matching.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMatchRequest {
    /// Bank or card account whose rows are matched.
    pub account_id: AccountId,
}

/// Request body for a manual match.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// `invoice`, `expense`, or `bill`.
    pub kind: DocumentKind,
    /// Document ID.
    pub document_id: Uuid,
}

/// Response for a bank transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Bank or card account.
    pub account_id: Uuid,
    /// Statement date.
    pub date: NaiveDate,
    /// Statement description.
    pub description: String,
    /// Signed amount; positive for deposits.
    pub amount: Decimal,
    /// Review status.
    pub status: String,
    /// Category account, assigned or suggested.
    pub category_account_id: Option<Uuid>,
    /// Payee.
    pub payee: Option<String>,
    /// Memo.
    pub memo: Option<String>,
    /// Rule that categorized or suggested.
    pub rule_id: Option<Uuid>,
    /// Categorization entry.
    pub journal_entry_id: Option<Uuid>,
    /// Kind of matched document.
    pub matched_kind: Option<String>,
    /// Matched document.
    pub matched_id: Option<Uuid>,
    /// Cleared against a statement.
    pub is_reconciled: bool,
    /// Reconciliation that cleared it.
    pub reconciliation_id: Option<Uuid>,
}

impl From<bank_transactions::Model> for BankTransactionResponse {
    fn from(model: bank_transactions::Model) -> Self {
        Self {
            is_reconciled: model.is_reconciled(),
            id: model.id,
            account_id: model.account_id,
            date: model.txn_date,
            amount: model.amount(),
            description: model.description,
            status: model.status,
            category_account_id: model.category_account_id,
            payee: model.payee,
            memo: model.memo,
            rule_id: model.rule_id,
            journal_entry_id: model.journal_entry_id,
            matched_kind: model.matched_kind,
            matched_id: model.matched_id,
            reconciliation_id: model.reconciliation_id,
        }
    }
}

fn repository(state: &AppState) -> BankTransactionRepository {
    BankTransactionRepository::new((*state.db).clone()).with_config(state.reconciliation.clone())
}

/// GET `/organizations/{org_id}/bank-transactions`
async fn list_transactions(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListTransactionsQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<BankTransactionResponse>>> {
    let filter = BankTransactionFilter {
        account_id: query.account_id,
        status: query.status,
        from: query.from,
        to: query.to,
    };
    let (rows, total) = repository(&state).list(org_id, &filter, &page).await?;
    Ok(Json(PageResponse::new(
        rows.into_iter().map(Into::into).collect(),
        page.page,
        page.per_page,
        total,
    )))
}

/// GET `/organizations/{org_id}/bank-transactions/{transaction_id}`
async fn get_transaction(
    State(state): State<AppState>,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
) -> ApiResult<Json<BankTransactionResponse>> {
    Ok(Json(repository(&state).get(org_id, transaction_id).await?.into()))
}

/// POST `/organizations/{org_id}/bank-transactions/import`
async fn import_rows(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<ImportRequest>,
) -> ApiResult<Json<ImportSummary>> {
    let summary = repository(&state)
        .import(org_id, actor.name(), payload.account_id, &payload.rows)
        .await?;
    Ok(Json(summary))
}

/// POST `/organizations/{org_id}/bank-transactions/import/preview` - Detect columns.
async fn preview_csv(
    Path(_org_id): Path<OrganizationId>,
    Json(payload): Json<PreviewRequest>,
) -> ApiResult<Json<ColumnDetection>> {
    Ok(Json(BankTransactionRepository::preview_csv(&payload.csv)?))
}

/// POST `/organizations/{org_id}/bank-transactions/import/csv`
async fn import_csv(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CsvImportRequest>,
) -> ApiResult<Json<ImportSummary>> {
    let summary = repository(&state)
        .import_csv(
            org_id,
            actor.name(),
            payload.account_id,
            &payload.csv,
            &payload.mapping,
        )
        .await?;
    Ok(Json(summary))
}

/// PATCH `/organizations/{org_id}/bank-transactions/{transaction_id}/status`
async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<BankTransactionResponse>> {
    let input = StatusChangeInput {
        status: payload.status,
        category_account: payload.category_account_id,
        payee: payload.payee,
        memo: payload.memo,
    };
    let row = repository(&state)
        .set_status(org_id, actor.name(), transaction_id, input)
        .await?;
    Ok(Json(row.into()))
}

/// POST `/organizations/{org_id}/bank-transactions/apply-rules`
async fn apply_rules(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<ApplyRulesRequest>,
) -> ApiResult<Json<RuleRunSummary>> {
    let summary = repository(&state)
        .apply_rules(org_id, actor.name(), payload.account_id)
        .await?;
    Ok(Json(summary))
}

/// POST `/organizations/{org_id}/bank-transactions/auto-match`
async fn auto_match(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<AutoMatchRequest>,
) -> ApiResult<Json<AutoMatchSummary>> {
    let summary = repository(&state)
        .auto_match(org_id, actor.name(), payload.account_id)
        .await?;
    Ok(Json(summary))
}

/// POST `/organizations/{org_id}/bank-transactions/{transaction_id}/match`
async fn match_document(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
    Json(payload): Json<MatchRequest>,
) -> ApiResult<Json<BankTransactionResponse>> {
    let row = repository(&state)
        .match_document(
            org_id,
            actor.name(),
            transaction_id,
            payload.kind,
            payload.document_id,
        )
        .await?;
    Ok(Json(row.into()))
}
