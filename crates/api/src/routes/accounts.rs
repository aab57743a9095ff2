//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::ledger::AccountType;
use tally_db::{
    entities::accounts,
    repositories::{AccountFilter, AccountRepository, CreateAccountInput, UpdateAccountInput},
};
use tally_shared::types::{AccountId, OrganizationId};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/accounts",
            get(list_accounts).post(create_account),
        )
        .route(
            "/organizations/{org_id}/accounts/{account_id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route(
            "/organizations/{org_id}/accounts/{account_id}/deactivate",
            post(deactivate_account),
        )
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account type label, e.g. `Credit Card`.
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Account name, unique within the organization.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Free-form detail type.
    pub detail_type: Option<String>,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// New name.
    pub name: Option<String>,
    /// New type (only while the account has no postings).
    pub account_type: Option<AccountType>,
    /// New detail type.
    pub detail_type: Option<String>,
}

/// Response for an account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Account type label.
    pub account_type: String,
    /// Detail type.
    pub detail_type: Option<String>,
    /// Book balance, signed by the normal side.
    pub balance: Decimal,
    /// Balance according to imported statements (bank-like accounts only).
    pub bank_balance: Option<Decimal>,
    /// Whether the account accepts postings.
    pub is_active: bool,
    /// Whether the account is required by the posting engine.
    pub is_system: bool,
}

impl From<accounts::Model> for AccountResponse {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            balance: model.balance(),
            bank_balance: model.bank_balance(),
            name: model.name,
            account_type: model.account_type,
            detail_type: model.detail_type,
            is_active: model.is_active,
            is_system: model.is_system,
        }
    }
}

/// GET `/organizations/{org_id}/accounts` - List accounts with balances.
async fn list_accounts(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let repo = AccountRepository::new((*state.db).clone());
    let filter = AccountFilter {
        account_type: query.account_type,
        is_active: query.is_active,
    };
    let accounts = repo.list(org_id, &filter).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// POST `/organizations/{org_id}/accounts`
async fn create_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let repo = AccountRepository::new((*state.db).clone());
    let input = CreateAccountInput {
        name: payload.name,
        account_type: payload.account_type,
        detail_type: payload.detail_type,
    };
    let account = repo.create(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/organizations/{org_id}/accounts/{account_id}`
async fn get_account(
    State(state): State<AppState>,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> ApiResult<Json<AccountResponse>> {
    let repo = AccountRepository::new((*state.db).clone());
    Ok(Json(repo.get(org_id, account_id).await?.into()))
}

/// PUT `/organizations/{org_id}/accounts/{account_id}`
async fn update_account(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let repo = AccountRepository::new((*state.db).clone());
    let input = UpdateAccountInput {
        name: payload.name,
        account_type: payload.account_type,
        detail_type: payload.detail_type,
    };
    let account = repo.update(org_id, actor.name(), account_id, input).await?;
    Ok(Json(account.into()))
}

/// POST `/organizations/{org_id}/accounts/{account_id}/deactivate`
async fn deactivate_account(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> ApiResult<Json<AccountResponse>> {
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo.deactivate(org_id, actor.name(), account_id).await?;
    Ok(Json(account.into()))
}

/// DELETE `/organizations/{org_id}/accounts/{account_id}` - Only accounts without history.
async fn delete_account(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> ApiResult<StatusCode> {
    let repo = AccountRepository::new((*state.db).clone());
    repo.delete(org_id, actor.name(), account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
