//! Reconciliation session repository.
//!
//! A session compares the cleared bank transactions of one account with a
//! statement ending balance. Ticking a transaction stamps it with the
//! session; completing the session requires the two balances to agree.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry};
use tally_core::reconciliation::{
    BankTransactionStatus, ClearableLine, SessionStatus, SessionSummary, ToggleEffect,
    check_complete, check_period, plan_toggle,
};
use tally_shared::types::money::to_minor_units;
use tally_shared::types::{AccountId, BankTransactionId, OrganizationId, ReconciliationId};

use super::audit::AuditRepository;
use super::bank_transaction::{self, bank_account};
use super::error::RepositoryError;
use super::organization::require;
use crate::begin_serializable;
use crate::entities::{bank_transactions, reconciliations};

const ENTITY: &str = "Reconciliation";

/// Input for starting a reconciliation.
#[derive(Debug, Clone)]
pub struct CreateReconciliationInput {
    /// Bank or credit card account to reconcile.
    pub account_id: AccountId,
    /// First day of the statement.
    pub start_date: NaiveDate,
    /// Last day of the statement.
    pub end_date: NaiveDate,
    /// Ending balance printed on the statement.
    pub statement_balance: Decimal,
}

/// A session with its running totals and the lines it can clear.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationWorkspace {
    /// The session.
    pub reconciliation: reconciliations::Model,
    /// Cleared balance against the statement.
    pub summary: SessionSummary,
    /// Uncleared lines up to the statement end plus the lines this session
    /// cleared, oldest first.
    pub transactions: Vec<bank_transactions::Model>,
}

/// Reconciliation session repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists sessions, latest statement first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        account_id: Option<AccountId>,
    ) -> Result<Vec<reconciliations::Model>, RepositoryError> {
        let mut query = reconciliations::Entity::find()
            .filter(reconciliations::Column::OrganizationId.eq(organization_id.into_inner()));
        if let Some(account_id) = account_id {
            query = query.filter(reconciliations::Column::AccountId.eq(account_id.into_inner()));
        }
        Ok(query
            .order_by_desc(reconciliations::Column::EndDate)
            .order_by_desc(reconciliations::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Loads a session with its summary and clearable lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn workspace(
        &self,
        organization_id: OrganizationId,
        reconciliation_id: ReconciliationId,
    ) -> Result<ReconciliationWorkspace, RepositoryError> {
        let reconciliation = find(&self.db, organization_id, reconciliation_id).await?;
        let summary = summarize(&self.db, &reconciliation).await?;

        let transactions = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(bank_transactions::Column::AccountId.eq(reconciliation.account_id))
            .filter(
                Condition::any()
                    .add(bank_transactions::Column::ReconciliationId.eq(reconciliation.id))
                    .add(
                        Condition::all()
                            .add(bank_transactions::Column::ReconciliationId.is_null())
                            .add(bank_transactions::Column::TxnDate.lte(reconciliation.end_date))
                            .add(
                                bank_transactions::Column::Status
                                    .ne(BankTransactionStatus::Excluded.as_str()),
                            ),
                    ),
            )
            .order_by_asc(bank_transactions::Column::TxnDate)
            .order_by_asc(bank_transactions::Column::Description)
            .all(&self.db)
            .await?;

        Ok(ReconciliationWorkspace {
            reconciliation,
            summary,
            transactions,
        })
    }

    /// Starts a reconciliation of a bank or credit card account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod`, `NotBankAccount`, `Conflict` if the account
    /// already has a session in progress, or a database error.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateReconciliationInput,
    ) -> Result<reconciliations::Model, RepositoryError> {
        check_period(input.start_date, input.end_date)?;
        let statement_balance_minor = to_minor_units(input.statement_balance)?;

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        let account = bank_account(&txn, organization_id, input.account_id).await?;

        let open = reconciliations::Entity::find()
            .filter(reconciliations::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(reconciliations::Column::AccountId.eq(account.id))
            .filter(reconciliations::Column::Status.eq(SessionStatus::InProgress.as_str()))
            .count(&txn)
            .await?;
        if open > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Account '{}' already has a reconciliation in progress",
                account.name
            )));
        }

        let now = Utc::now().into();
        let model = reconciliations::ActiveModel {
            id: Set(ReconciliationId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            account_id: Set(account.id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            statement_balance_minor: Set(statement_balance_minor),
            status: Set(SessionStatus::InProgress.as_str().to_string()),
            completed_at: Set(None),
            created_by: Set(actor.to_string()),
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
                EntityType::Reconciliation,
                model.id,
                json!({
                    "accountId": model.account_id,
                    "startDate": model.start_date,
                    "endDate": model.end_date,
                    "statementBalance": model.statement_balance(),
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            reconciliation_id = %model.id,
            account_id = %model.account_id,
            "Reconciliation started"
        );
        Ok(model)
    }

    /// Ticks a bank transaction off against the statement, or unticks it if
    /// this session already cleared it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `SessionCompleted`, `WrongAccount`,
    /// `OutsideStatementPeriod`, `ExcludedTransaction`,
    /// `ReconciledElsewhere`, or a database error.
    pub async fn toggle(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        reconciliation_id: ReconciliationId,
        transaction_id: BankTransactionId,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let session = find(&txn, organization_id, reconciliation_id)
            .await?
            .session()?;
        let existing = bank_transaction::find(&txn, organization_id, transaction_id).await?;

        let line = ClearableLine {
            account_id: existing.account_id.into(),
            date: existing.txn_date,
            status: existing.status()?,
            reconciled_in: existing.reconciliation_id.map(ReconciliationId::from_uuid),
        };
        let effect = plan_toggle(&session, &line)?;

        let mut active: bank_transactions::ActiveModel = existing.into();
        active.reconciliation_id = Set(match effect {
            ToggleEffect::Reconcile => Some(session.id.into_inner()),
            ToggleEffect::Unreconcile => None,
        });
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Reconcile,
                EntityType::BankTransaction,
                updated.id,
                json!({
                    "reconciliationId": session.id,
                    "reconciled": updated.is_reconciled(),
                }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Completes a session whose cleared balance agrees with the statement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `SessionCompleted`, `OutOfBalance`, or a database
    /// error.
    pub async fn complete(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        reconciliation_id: ReconciliationId,
    ) -> Result<reconciliations::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, reconciliation_id).await?;
        let summary = summarize(&txn, &existing).await?;
        check_complete(&existing.session()?, &summary)?;

        let now = Utc::now().into();
        let mut active: reconciliations::ActiveModel = existing.into();
        active.status = Set(SessionStatus::Completed.as_str().to_string());
        active.completed_at = Set(Some(now));
        active.updated_at = Set(now);
        let completed = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::status_change(SessionStatus::Completed.as_str()),
                EntityType::Reconciliation,
                completed.id,
                json!({
                    "statementBalance": summary.statement_balance,
                    "clearedBalance": summary.cleared_balance,
                    "reconciledCount": summary.reconciled_count,
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            reconciliation_id = %completed.id,
            reconciled = summary.reconciled_count,
            "Reconciliation completed"
        );
        Ok(completed)
    }
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    reconciliation_id: ReconciliationId,
) -> Result<reconciliations::Model, RepositoryError> {
    reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
        .filter(reconciliations::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, reconciliation_id))
}

/// Cleared balance: every reconciled line of the account up to the statement
/// end, whichever session cleared it.
async fn summarize<C: ConnectionTrait>(
    conn: &C,
    reconciliation: &reconciliations::Model,
) -> Result<SessionSummary, RepositoryError> {
    let cleared = bank_transactions::Entity::find()
        .filter(bank_transactions::Column::OrganizationId.eq(reconciliation.organization_id))
        .filter(bank_transactions::Column::AccountId.eq(reconciliation.account_id))
        .filter(bank_transactions::Column::ReconciliationId.is_not_null())
        .filter(bank_transactions::Column::TxnDate.lte(reconciliation.end_date))
        .all(conn)
        .await?;

    let in_session = cleared
        .iter()
        .filter(|line| line.reconciliation_id == Some(reconciliation.id))
        .count();
    Ok(SessionSummary::compute(
        reconciliation.statement_balance(),
        cleared.iter().map(bank_transactions::Model::amount),
        in_session,
    ))
}
