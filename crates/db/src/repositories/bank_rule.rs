//! Bank rule repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry, changes_detail, diff_fields};
use tally_core::reconciliation::{BankRule, RuleCondition};
use tally_shared::types::{AccountId, BankRuleId, OrganizationId};

use super::account;
use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use crate::begin_serializable;
use crate::entities::bank_rules;

const ENTITY: &str = "Bank rule";

/// Input for creating a bank rule.
#[derive(Debug, Clone)]
pub struct CreateBankRuleInput {
    /// Rule name.
    pub name: String,
    /// Evaluation order; lower runs first.
    pub priority: i32,
    /// Conditions that must all hold.
    pub conditions: Vec<RuleCondition>,
    /// Category account to assign.
    pub assign_account: Option<AccountId>,
    /// Payee to assign.
    pub assign_payee: Option<String>,
    /// Categorize immediately instead of suggesting.
    pub auto_confirm: bool,
    /// Whether the rule is evaluated.
    pub is_active: bool,
}

/// Input for updating a bank rule.
#[derive(Debug, Clone, Default)]
pub struct UpdateBankRuleInput {
    /// New name.
    pub name: Option<String>,
    /// New priority.
    pub priority: Option<i32>,
    /// Replacement conditions.
    pub conditions: Option<Vec<RuleCondition>>,
    /// New category account.
    pub assign_account: Option<AccountId>,
    /// New payee.
    pub assign_payee: Option<String>,
    /// New auto-confirm flag.
    pub auto_confirm: Option<bool>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Bank rule repository.
#[derive(Debug, Clone)]
pub struct BankRuleRepository {
    db: DatabaseConnection,
}

impl BankRuleRepository {
    /// Creates a new bank rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists rules in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<bank_rules::Model>, RepositoryError> {
        load(&self.db, organization_id).await
    }

    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule`, `NotFound` for an unknown account, or a
    /// database error.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateBankRuleInput,
    ) -> Result<bank_rules::Model, RepositoryError> {
        let rule = BankRule {
            id: BankRuleId::new(),
            name: input.name.trim().to_string(),
            priority: input.priority,
            conditions: input.conditions,
            assign_account: input.assign_account,
            assign_payee: input.assign_payee,
            auto_confirm: input.auto_confirm,
            is_active: input.is_active,
        };
        rule.validate()?;

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        if let Some(account_id) = rule.assign_account {
            account::find(&txn, organization_id, account_id).await?;
        }

        let now = Utc::now().into();
        let model = bank_rules::ActiveModel {
            id: Set(rule.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(rule.name.clone()),
            priority: Set(rule.priority),
            conditions: Set(serde_json::to_string(&rule.conditions)?),
            assign_account_id: Set(rule.assign_account.map(AccountId::into_inner)),
            assign_payee: Set(rule.assign_payee.clone()),
            auto_confirm: Set(rule.auto_confirm),
            is_active: Set(rule.is_active),
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
                EntityType::BankRule,
                model.id,
                serde_json::to_value(&rule)?,
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Updates a rule.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidRule`, or a database error.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        rule_id: BankRuleId,
        input: UpdateBankRuleInput,
    ) -> Result<bank_rules::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, rule_id).await?;
        let before = existing.rule()?;

        let mut rule = before.clone();
        if let Some(name) = input.name {
            rule.name = name.trim().to_string();
        }
        if let Some(priority) = input.priority {
            rule.priority = priority;
        }
        if let Some(conditions) = input.conditions {
            rule.conditions = conditions;
        }
        if let Some(account_id) = input.assign_account {
            account::find(&txn, organization_id, account_id).await?;
            rule.assign_account = Some(account_id);
        }
        if let Some(payee) = input.assign_payee {
            rule.assign_payee = Some(payee);
        }
        if let Some(auto_confirm) = input.auto_confirm {
            rule.auto_confirm = auto_confirm;
        }
        if let Some(is_active) = input.is_active {
            rule.is_active = is_active;
        }
        rule.validate()?;

        let mut active: bank_rules::ActiveModel = existing.into();
        active.name = Set(rule.name.clone());
        active.priority = Set(rule.priority);
        active.conditions = Set(serde_json::to_string(&rule.conditions)?);
        active.assign_account_id = Set(rule.assign_account.map(AccountId::into_inner));
        active.assign_payee = Set(rule.assign_payee.clone());
        active.auto_confirm = Set(rule.auto_confirm);
        active.is_active = Set(rule.is_active);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Update,
                EntityType::BankRule,
                updated.id,
                changes_detail(&diff_fields(
                    &serde_json::to_value(&before)?,
                    &serde_json::to_value(&rule)?,
                )),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes a rule. Transactions it categorized keep their rule ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        rule_id: BankRuleId,
    ) -> Result<(), RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, rule_id).await?;

        bank_rules::Entity::delete_by_id(existing.id).exec(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Delete,
                EntityType::BankRule,
                existing.id,
                json!({ "name": existing.name }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }
}

/// Loads every rule of the organization, ordered by priority then name.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<bank_rules::Model>, RepositoryError> {
    Ok(bank_rules::Entity::find()
        .filter(bank_rules::Column::OrganizationId.eq(organization_id.into_inner()))
        .order_by_asc(bank_rules::Column::Priority)
        .order_by_asc(bank_rules::Column::Name)
        .all(conn)
        .await?)
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    rule_id: BankRuleId,
) -> Result<bank_rules::Model, RepositoryError> {
    bank_rules::Entity::find_by_id(rule_id.into_inner())
        .filter(bank_rules::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, rule_id))
}
