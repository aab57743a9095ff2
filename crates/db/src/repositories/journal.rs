//! Journal repository: manual entries, transfers, reversals and queries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry};
use tally_core::ledger::{EntrySource, JournalLineInput};
use tally_core::posting::{PostingEvent, PostingService};
use tally_shared::types::{AccountId, JournalEntryId, OrganizationId, PageRequest};

use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use super::posting::{PostedJournal, PostingRepository};
use crate::begin_serializable;
use crate::entities::journal_entries;

/// Filter options for listing journal entries.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Only entries from this source.
    pub source: Option<EntrySource>,
    /// Entries dated on or after.
    pub from: Option<NaiveDate>,
    /// Entries dated on or before.
    pub to: Option<NaiveDate>,
}

/// Input for a manual adjustment.
#[derive(Debug, Clone)]
pub struct ManualEntryInput {
    /// Posting date.
    pub date: NaiveDate,
    /// Entry memo.
    pub memo: String,
    /// Lines; they must balance.
    pub lines: Vec<JournalLineInput>,
}

/// Input for a transfer between two accounts.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Posting date.
    pub date: NaiveDate,
    /// Account credited.
    pub from_account: AccountId,
    /// Account debited.
    pub to_account: AccountId,
    /// Amount moved.
    pub amount: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists entry headers, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        filter: &JournalFilter,
        page: &PageRequest,
    ) -> Result<(Vec<journal_entries::Model>, u64), RepositoryError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(source) = filter.source {
            query = query.filter(journal_entries::Column::Source.eq(source.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::EntryNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Gets an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` or a database error.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        entry_id: JournalEntryId,
    ) -> Result<PostedJournal, RepositoryError> {
        PostedJournal::load(&self.db, organization_id, entry_id.into_inner()).await
    }

    /// Posts a manual adjustment.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the lines do not form a balanced
    /// entry, an account error, or a database error.
    pub async fn post_manual(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: ManualEntryInput,
    ) -> Result<PostedJournal, RepositoryError> {
        let event = PostingEvent::ManualAdjustment {
            date: input.date,
            memo: input.memo,
            lines: input.lines,
        };
        self.post_event(organization_id, actor, &event).await
    }

    /// Posts a transfer between two accounts.
    ///
    /// # Errors
    ///
    /// Returns `SameAccountTransfer`, `ZeroAmount`, an account error, or a
    /// database error.
    pub async fn post_transfer(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: TransferInput,
    ) -> Result<PostedJournal, RepositoryError> {
        let event = PostingEvent::Transfer {
            date: input.date,
            from_account: input.from_account,
            to_account: input.to_account,
            amount: input.amount,
            memo: input.memo,
        };
        self.post_event(organization_id, actor, &event).await
    }

    /// Reverses a posted entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `AlreadyReversed`, `ReversalOfReversal` or a
    /// database error.
    pub async fn reverse(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        entry_id: JournalEntryId,
        date: Option<NaiveDate>,
        reason: &str,
    ) -> Result<PostedJournal, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let reversal = PostingRepository::reverse_in_txn(
            &txn,
            organization_id,
            actor,
            entry_id.into_inner(),
            date,
            reason,
        )
        .await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Reverse,
                EntityType::JournalEntry,
                entry_id,
                json!({
                    "reversalEntryId": reversal.entry.id,
                    "reversalNumber": reversal.entry.entry_number,
                    "reason": reason,
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            entry_id = %entry_id,
            reversal = %reversal.entry.entry_number,
            "Journal entry reversed"
        );
        Ok(reversal)
    }

    async fn post_event(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        event: &PostingEvent,
    ) -> Result<PostedJournal, RepositoryError> {
        let plan = PostingService::plan(event)?;

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        let posted = PostingRepository::post_in_txn(&txn, organization_id, actor, &plan).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::JournalEntry,
                posted.entry.id,
                json!({
                    "entryNumber": posted.entry.entry_number,
                    "source": posted.entry.source,
                    "memo": posted.entry.memo,
                    "total": plan.total(),
                }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(posted)
    }
}
