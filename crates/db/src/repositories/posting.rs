//! Journal posting inside an open transaction.
//!
//! Every other repository posts through here so that entry numbering,
//! account resolution and balance maintenance happen in one place. Nothing
//! here writes an audit entry; the calling mutation records exactly one.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::numbering::ENTRY_PREFIX;
use tally_core::ledger::{
    EntrySource, LedgerError, PostedEntry, ReversalService, calculate_balance_change,
    format_entry_number, next_sequence, validate_lines,
};
use tally_core::posting::{AccountRef, PlannedLine, PostingPlan, SystemAccount};
use tally_shared::types::OrganizationId;
use tally_shared::types::money::to_minor_units;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::{accounts, journal_entries, journal_lines};

/// A journal entry together with its lines, in posting order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PostedJournal {
    /// Entry header.
    pub entry: journal_entries::Model,
    /// Entry lines.
    pub lines: Vec<journal_lines::Model>,
}

impl PostedJournal {
    /// Loads an entry of the organization with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if no such entry exists.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        entry_id: Uuid,
    ) -> Result<Self, RepositoryError> {
        let entry = journal_entries::Entity::find_by_id(entry_id)
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(conn)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::EntryId.eq(entry_id))
            .order_by_asc(journal_lines::Column::SortOrder)
            .all(conn)
            .await?;
        Ok(Self { entry, lines })
    }

    /// View of the entry used for reversal planning.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntrySource` if the stored source is not recognized.
    pub fn posted_entry(&self) -> Result<PostedEntry, LedgerError> {
        Ok(PostedEntry {
            id: self.entry.id.into(),
            entry_number: self.entry.entry_number.clone(),
            date: self.entry.entry_date,
            source: self.entry.source()?,
            reversed_by: self.entry.reversed_by_entry_id.map(Into::into),
            lines: self.lines.iter().map(journal_lines::Model::to_input).collect(),
        })
    }
}

/// Posts and reverses journal entries.
pub struct PostingRepository;

impl PostingRepository {
    /// Posts a plan as a new journal entry.
    ///
    /// System accounts named by the plan are created on first use. Regular
    /// accounts must belong to the organization and be active.
    ///
    /// # Errors
    ///
    /// Returns a line validation error, `AccountNotFound`, `AccountInactive`
    /// or a database error.
    pub async fn post_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        plan: &PostingPlan,
    ) -> Result<PostedJournal, RepositoryError> {
        Self::insert(txn, organization_id, actor, plan, None).await
    }

    /// Posts the mirror of an entry and links the two.
    ///
    /// The reversal keeps the original `source_id` and may touch accounts
    /// deactivated since the original was posted.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `AlreadyReversed`, `ReversalOfReversal` or a
    /// database error.
    pub async fn reverse_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        entry_id: Uuid,
        date: Option<NaiveDate>,
        reason: &str,
    ) -> Result<PostedJournal, RepositoryError> {
        let original = PostedJournal::load(txn, organization_id, entry_id).await?;
        let reversal = ReversalService::plan(&original.posted_entry()?, date, reason)?;

        let plan = PostingPlan {
            date: reversal.date,
            memo: reversal.memo,
            source: EntrySource::Reversal,
            source_id: original.entry.source_id,
            lines: reversal
                .lines
                .into_iter()
                .map(|line| PlannedLine {
                    account: AccountRef::Account(line.account_id),
                    debit: line.debit,
                    credit: line.credit,
                    memo: line.memo,
                })
                .collect(),
        };

        let posted = Self::insert(txn, organization_id, actor, &plan, Some(entry_id)).await?;

        let mut original: journal_entries::ActiveModel = original.entry.into();
        original.reversed_by_entry_id = Set(Some(posted.entry.id));
        original.update(txn).await?;

        Ok(posted)
    }

    /// Reverses every live entry posted for a source document.
    ///
    /// Entries already reversed and reversal entries are skipped, so calling
    /// this twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns a database error or any error from [`Self::reverse_in_txn`].
    pub async fn reverse_source_in_txn(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        source_id: Uuid,
        date: Option<NaiveDate>,
        reason: &str,
    ) -> Result<Vec<PostedJournal>, RepositoryError> {
        let live: Vec<Uuid> = journal_entries::Entity::find()
            .select_only()
            .column(journal_entries::Column::Id)
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journal_entries::Column::SourceId.eq(source_id))
            .filter(journal_entries::Column::ReversedByEntryId.is_null())
            .filter(journal_entries::Column::Source.ne(EntrySource::Reversal.as_str()))
            .order_by_asc(journal_entries::Column::EntryNumber)
            .into_tuple()
            .all(txn)
            .await?;

        let mut reversals = Vec::with_capacity(live.len());
        for entry_id in live {
            reversals.push(
                Self::reverse_in_txn(txn, organization_id, actor, entry_id, date, reason).await?,
            );
        }
        Ok(reversals)
    }

    async fn insert(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        actor: &str,
        plan: &PostingPlan,
        reverses: Option<Uuid>,
    ) -> Result<PostedJournal, RepositoryError> {
        validate_lines(&plan.lines)?;

        let mut resolved: HashMap<AccountRef, accounts::Model> = HashMap::new();
        for line in &plan.lines {
            if resolved.contains_key(&line.account) {
                continue;
            }
            let account = match line.account {
                AccountRef::System(system) => {
                    Self::system_account(txn, organization_id, system).await?
                }
                AccountRef::Account(id) => {
                    let account = accounts::Entity::find_by_id(id.into_inner())
                        .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
                        .one(txn)
                        .await?
                        .ok_or(LedgerError::AccountNotFound(id.into_inner()))?;
                    if !account.is_active && reverses.is_none() {
                        return Err(LedgerError::AccountInactive(account.id).into());
                    }
                    account
                }
            };
            resolved.insert(line.account, account);
        }

        let numbers: Vec<String> = journal_entries::Entity::find()
            .select_only()
            .column(journal_entries::Column::EntryNumber)
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .into_tuple()
            .all(txn)
            .await?;
        let sequence = next_sequence(numbers.iter().map(String::as_str), ENTRY_PREFIX, 1);

        let now = Utc::now().into();
        let entry_id = Uuid::now_v7();
        let entry = journal_entries::ActiveModel {
            id: Set(entry_id),
            organization_id: Set(organization_id.into_inner()),
            entry_number: Set(format_entry_number(sequence)),
            entry_date: Set(plan.date),
            memo: Set(plan.memo.clone()),
            source: Set(plan.source.as_str().to_string()),
            source_id: Set(plan.source_id),
            reverses_entry_id: Set(reverses),
            reversed_by_entry_id: Set(None),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "journal entry number already taken"))?;

        let mut lines = Vec::with_capacity(plan.lines.len());
        for (index, planned) in plan.lines.iter().enumerate() {
            let Some(account) = resolved.get(&planned.account) else {
                continue;
            };

            let line = journal_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                entry_id: Set(entry_id),
                organization_id: Set(organization_id.into_inner()),
                account_id: Set(account.id),
                debit_minor: Set(to_minor_units(planned.debit)?),
                credit_minor: Set(to_minor_units(planned.credit)?),
                memo: Set(planned.memo.clone()),
                sort_order: Set(i32::try_from(index).unwrap_or(i32::MAX)),
            }
            .insert(txn)
            .await?;

            let change =
                calculate_balance_change(account.account_type()?, planned.debit, planned.credit);
            accounts::Entity::update_many()
                .col_expr(
                    accounts::Column::BalanceMinor,
                    Expr::col(accounts::Column::BalanceMinor).add(to_minor_units(change)?),
                )
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(account.id))
                .exec(txn)
                .await?;

            lines.push(line);
        }

        tracing::debug!(
            organization_id = %organization_id,
            entry_number = %entry.entry_number,
            source = %plan.source,
            lines = lines.len(),
            "Journal entry posted"
        );

        Ok(PostedJournal { entry, lines })
    }

    /// Finds a system account by name, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn system_account(
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        system: SystemAccount,
    ) -> Result<accounts::Model, RepositoryError> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(accounts::Column::Name.eq(system.name()))
            .one(txn)
            .await?;
        if let Some(account) = existing {
            return Ok(account);
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(system.name().to_string()),
            account_type: Set(system.account_type().as_str().to_string()),
            detail_type: Set(Some(system.detail_type().to_string())),
            balance_minor: Set(0),
            bank_balance_minor: Set(None),
            is_active: Set(true),
            is_system: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
        Ok(account)
    }
}
