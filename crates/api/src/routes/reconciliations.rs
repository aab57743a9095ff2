//! Statement reconciliation routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::SessionSummary;
use tally_db::{
    entities::reconciliations,
    repositories::{CreateReconciliationInput, ReconciliationRepository, ReconciliationWorkspace},
};
use tally_shared::types::{AccountId, BankTransactionId, OrganizationId, ReconciliationId};
use uuid::Uuid;

use super::bank_transactions::BankTransactionResponse;
use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/reconciliations",
            get(list_reconciliations).post(create_reconciliation),
        )
        .route(
            "/organizations/{org_id}/reconciliations/{reconciliation_id}",
            get(get_workspace),
        )
        .route(
            "/organizations/{org_id}/reconciliations/{reconciliation_id}/complete",
            post(complete_reconciliation),
        )
        .route(
            "/organizations/{org_id}/reconciliations/{reconciliation_id}/toggle/{transaction_id}",
            post(toggle_transaction),
        )
}

/// Query parameters for listing reconciliations.
#[derive(Debug, Deserialize)]
pub struct ListReconciliationsQuery {
    /// Only this bank or card account.
    pub account_id: Option<AccountId>,
}

/// Request body for starting a reconciliation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReconciliationRequest {
    /// Bank or card account.
    pub account_id: AccountId,
    /// Statement start.
    pub start_date: NaiveDate,
    /// Statement end.
    pub end_date: NaiveDate,
    /// Statement ending balance.
    pub statement_balance: Decimal,
}

/// Response for a reconciliation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    /// Reconciliation ID.
    pub id: Uuid,
    /// Bank or card account.
    pub account_id: Uuid,
    /// Statement start.
    pub start_date: NaiveDate,
    /// Statement end.
    pub end_date: NaiveDate,
    /// Statement ending balance.
    pub statement_balance: Decimal,
    /// `in_progress` or `completed`.
    pub status: String,
    /// When the statement was agreed.
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// Who started it.
    pub created_by: String,
}

impl From<reconciliations::Model> for ReconciliationResponse {
    fn from(model: reconciliations::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            start_date: model.start_date,
            end_date: model.end_date,
            statement_balance: model.statement_balance(),
            status: model.status,
            completed_at: model.completed_at,
            created_by: model.created_by,
        }
    }
}

/// Response for a reconciliation with its lines.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    /// The reconciliation.
    pub reconciliation: ReconciliationResponse,
    /// Cleared balance against the statement.
    #[serde(flatten)]
    pub summary: SessionSummary,
    /// Lines that can be cleared, and those already cleared here.
    pub transactions: Vec<BankTransactionResponse>,
}

impl From<ReconciliationWorkspace> for WorkspaceResponse {
    fn from(workspace: ReconciliationWorkspace) -> Self {
        Self {
            reconciliation: workspace.reconciliation.into(),
            summary: workspace.summary,
            transactions: workspace.transactions.into_iter().map(Into::into).collect(),
        }
    }
}

fn repository(state: &AppState) -> ReconciliationRepository {
    ReconciliationRepository::new((*state.db).clone())
}

/// GET `/organizations/{org_id}/reconciliations`
async fn list_reconciliations(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListReconciliationsQuery>,
) -> ApiResult<Json<Vec<ReconciliationResponse>>> {
    let rows = repository(&state).list(org_id, query.account_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST `/organizations/{org_id}/reconciliations`
async fn create_reconciliation(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateReconciliationRequest>,
) -> ApiResult<(StatusCode, Json<ReconciliationResponse>)> {
    let input = CreateReconciliationInput {
        account_id: payload.account_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        statement_balance: payload.statement_balance,
    };
    let created = repository(&state).create(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/organizations/{org_id}/reconciliations/{reconciliation_id}`
async fn get_workspace(
    State(state): State<AppState>,
    Path((org_id, reconciliation_id)): Path<(OrganizationId, ReconciliationId)>,
) -> ApiResult<Json<WorkspaceResponse>> {
    let workspace = repository(&state).workspace(org_id, reconciliation_id).await?;
    Ok(Json(workspace.into()))
}

/// POST `/organizations/{org_id}/reconciliations/{reconciliation_id}/toggle/{transaction_id}`
async fn toggle_transaction(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, reconciliation_id, transaction_id)): Path<(
        OrganizationId,
        ReconciliationId,
        BankTransactionId,
    )>,
) -> ApiResult<Json<BankTransactionResponse>> {
    let row = repository(&state)
        .toggle(org_id, actor.name(), reconciliation_id, transaction_id)
        .await?;
    Ok(Json(row.into()))
}

/// POST `/organizations/{org_id}/reconciliations/{reconciliation_id}/complete`
async fn complete_reconciliation(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, reconciliation_id)): Path<(OrganizationId, ReconciliationId)>,
) -> ApiResult<Json<ReconciliationResponse>> {
    let completed = repository(&state)
        .complete(org_id, actor.name(), reconciliation_id)
        .await?;
    Ok(Json(completed.into()))
}
