//! Account repository for chart of accounts operations.
//!
//! Balances are never written here; they move only through posting.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry, changes_detail, diff_fields};
use tally_core::ledger::AccountType;
use tally_shared::types::{AccountId, OrganizationId};
use uuid::Uuid;

use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use crate::begin_serializable;
use crate::entities::{accounts, bank_transactions, journal_lines};

const ENTITY: &str = "Account";

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active (true) or inactive (false) accounts.
    pub is_active: Option<bool>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account name, unique within the organization.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Free-form detail type.
    pub detail_type: Option<String>,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New type; rejected once the account has journal lines.
    pub account_type: Option<AccountType>,
    /// New detail type.
    pub detail_type: Option<String>,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists accounts in chart order (type, then name).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        filter: &AccountFilter,
    ) -> Result<Vec<accounts::Model>, RepositoryError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::Column::AccountType.eq(account_type.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(accounts::Column::IsActive.eq(is_active));
        }

        let mut rows = query
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await?;
        rows.sort_by_key(|row| {
            row.account_type()
                .ok()
                .and_then(|t| AccountType::ALL.iter().position(|a| *a == t))
                .unwrap_or(usize::MAX)
        });
        Ok(rows)
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist in the organization.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
    ) -> Result<accounts::Model, RepositoryError> {
        find(&self.db, organization_id, account_id).await
    }

    /// Creates an account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name, `Conflict` if the name is
    /// taken, or a database error.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let account = Self::create_in_txn(&txn, organization_id, actor, &input).await?;
        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            account_id = %account.id,
            account_type = %account.account_type,
            "Account created"
        );
        Ok(account)
    }

    /// Creates an account inside an open transaction, with its audit entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `OrganizationNotFound`, `Conflict` or a
    /// database error.
    pub async fn create_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        input: &CreateAccountInput,
    ) -> Result<accounts::Model, RepositoryError> {
        let name = clean_name(&input.name)?;
        require(txn, organization_id).await?;

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(name.clone()),
            account_type: Set(input.account_type.as_str().to_string()),
            detail_type: Set(input.detail_type.clone()),
            balance_minor: Set(0),
            bank_balance_minor: Set(input.account_type.is_bank_like().then_some(0)),
            is_active: Set(true),
            is_system: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| RepositoryError::from_insert(e, format!("account '{name}' already exists")))?;

        AuditRepository::record_in_txn(
            txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::Account,
                account.id,
                json!({
                    "name": account.name,
                    "accountType": account.account_type,
                    "detailType": account.detail_type,
                }),
            ),
        )
        .await?;

        Ok(account)
    }

    /// Updates name, type or detail type.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation`, `Conflict`, `AccountTypeLocked` when
    /// the type changes on an account with journal lines, or a database error.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, account_id).await?;
        let before = describe(&existing);

        let mut active: accounts::ActiveModel = existing.clone().into();
        if let Some(name) = &input.name {
            active.name = Set(clean_name(name)?);
        }
        if let Some(account_type) = input.account_type
            && account_type.as_str() != existing.account_type
        {
            if has_lines(&txn, existing.id).await? {
                return Err(RepositoryError::AccountTypeLocked(existing.id));
            }
            active.account_type = Set(account_type.as_str().to_string());
            if account_type.is_bank_like() && existing.bank_balance_minor.is_none() {
                active.bank_balance_minor = Set(Some(0));
            }
        }
        if let Some(detail_type) = input.detail_type {
            active.detail_type = Set(Some(detail_type));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "account name already exists"))?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Update,
                EntityType::Account,
                updated.id,
                changes_detail(&diff_fields(&before, &describe(&updated))),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deactivates an account; later postings to it are rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn deactivate(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
    ) -> Result<accounts::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, account_id).await?;

        let mut active: accounts::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Update,
                EntityType::Account,
                updated.id,
                changes_detail(&diff_fields(
                    &json!({ "isActive": true }),
                    &json!({ "isActive": false }),
                )),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes an account that has never been used.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AccountHasHistory` if journal lines or bank
    /// transactions reference the account, or a database error.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
    ) -> Result<(), RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, account_id).await?;

        let statement_rows = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::AccountId.eq(existing.id))
            .count(&txn)
            .await?;
        if statement_rows > 0 || has_lines(&txn, existing.id).await? {
            return Err(RepositoryError::AccountHasHistory(existing.id));
        }

        accounts::Entity::delete_by_id(existing.id).exec(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Delete,
                EntityType::Account,
                existing.id,
                describe(&existing),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }
}

/// Loads an account of the organization.
pub(crate) async fn find<C: sea_orm::ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    account_id: AccountId,
) -> Result<accounts::Model, RepositoryError> {
    accounts::Entity::find_by_id(account_id.into_inner())
        .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, account_id))
}

async fn has_lines(txn: &DatabaseTransaction, account_id: Uuid) -> Result<bool, RepositoryError> {
    let count = journal_lines::Entity::find()
        .filter(journal_lines::Column::AccountId.eq(account_id))
        .count(txn)
        .await?;
    Ok(count > 0)
}

fn clean_name(name: &str) -> Result<String, RepositoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RepositoryError::Validation(
            "account name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn describe(account: &accounts::Model) -> serde_json::Value {
    json!({
        "name": account.name,
        "accountType": account.account_type,
        "detailType": account.detail_type,
        "isActive": account.is_active,
    })
}
