//! Bank rule routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::RuleCondition;
use tally_db::{
    RepositoryError,
    entities::bank_rules,
    repositories::{BankRuleRepository, CreateBankRuleInput, UpdateBankRuleInput},
};
use tally_shared::types::{AccountId, BankRuleId, OrganizationId};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::Actor,
};

/// Creates the bank rule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/bank-rules",
            get(list_rules).post(create_rule),
        )
        .route(
            "/organizations/{org_id}/bank-rules/{rule_id}",
            put(update_rule).delete(delete_rule),
        )
}

const fn default_true() -> bool {
    true
}

/// Request body for creating a rule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankRuleRequest {
    /// Rule name.
    pub name: String,
    /// Lower runs first.
    #[serde(default)]
    pub priority: i32,
    /// All must hold.
    pub conditions: Vec<RuleCondition>,
    /// Category account to assign.
    pub assign_account_id: Option<AccountId>,
    /// Payee to assign.
    pub assign_payee: Option<String>,
    /// Categorize without review.
    #[serde(default)]
    pub auto_confirm: bool,
    /// Whether the rule runs.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request body for updating a rule.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankRuleRequest {
    /// New name.
    pub name: Option<String>,
    /// New priority.
    pub priority: Option<i32>,
    /// Replacement conditions.
    pub conditions: Option<Vec<RuleCondition>>,
    /// New category account.
    pub assign_account_id: Option<AccountId>,
    /// New payee.
    pub assign_payee: Option<String>,
    /// New auto-confirm flag.
    pub auto_confirm: Option<bool>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Response for a rule.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRuleResponse {
    /// Rule ID.
    pub id: Uuid,
    /// Rule name.
    pub name: String,
    /// Lower runs first.
    pub priority: i32,
    /// Conditions, all of which must hold.
    pub conditions: Vec<RuleCondition>,
    /// Category account assigned.
    pub assign_account_id: Option<Uuid>,
    /// Payee assigned.
    pub assign_payee: Option<String>,
    /// Categorize without review.
    pub auto_confirm: bool,
    /// Whether the rule runs.
    pub is_active: bool,
}

impl TryFrom<bank_rules::Model> for BankRuleResponse {
    type Error = ApiError;

    fn try_from(model: bank_rules::Model) -> Result<Self, Self::Error> {
        let rule = model.rule().map_err(RepositoryError::from)?;
        Ok(Self {
            id: model.id,
            name: model.name,
            priority: model.priority,
            conditions: rule.conditions,
            assign_account_id: model.assign_account_id,
            assign_payee: model.assign_payee,
            auto_confirm: model.auto_confirm,
            is_active: model.is_active,
        })
    }
}

/// GET `/organizations/{org_id}/bank-rules` - Rules in priority order.
async fn list_rules(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<BankRuleResponse>>> {
    let repo = BankRuleRepository::new((*state.db).clone());
    let rules = repo
        .list(org_id)
        .await?
        .into_iter()
        .map(BankRuleResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(rules))
}

/// POST `/organizations/{org_id}/bank-rules`
async fn create_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateBankRuleRequest>,
) -> ApiResult<(StatusCode, Json<BankRuleResponse>)> {
    let repo = BankRuleRepository::new((*state.db).clone());
    let input = CreateBankRuleInput {
        name: payload.name,
        priority: payload.priority,
        conditions: payload.conditions,
        assign_account: payload.assign_account_id,
        assign_payee: payload.assign_payee,
        auto_confirm: payload.auto_confirm,
        is_active: payload.is_active,
    };
    let rule = repo.create(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(rule.try_into()?)))
}

/// PUT `/organizations/{org_id}/bank-rules/{rule_id}`
async fn update_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, rule_id)): Path<(OrganizationId, BankRuleId)>,
    Json(payload): Json<UpdateBankRuleRequest>,
) -> ApiResult<Json<BankRuleResponse>> {
    let repo = BankRuleRepository::new((*state.db).clone());
    let input = UpdateBankRuleInput {
        name: payload.name,
        priority: payload.priority,
        conditions: payload.conditions,
        assign_account: payload.assign_account_id,
        assign_payee: payload.assign_payee,
        auto_confirm: payload.auto_confirm,
        is_active: payload.is_active,
    };
    let rule = repo.update(org_id, actor.name(), rule_id, input).await?;
    Ok(Json(rule.try_into()?))
}

/// DELETE `/organizations/{org_id}/bank-rules/{rule_id}`
async fn delete_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, rule_id)): Path<(OrganizationId, BankRuleId)>,
) -> ApiResult<StatusCode> {
    let repo = BankRuleRepository::new((*state.db).clone());
    repo.delete(org_id, actor.name(), rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
