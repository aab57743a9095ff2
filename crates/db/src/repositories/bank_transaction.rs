//! Bank transaction repository.
//!
//! Imports statement lines, moves them through the review states and
//! matches them to invoices, expenses, and bills. A categorized line owns a
//! journal entry; undoing the categorization reverses it.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry};
use tally_core::expense::ExpenseType;
use tally_core::invoice::{InvoiceStatus, InvoiceUpdate};
use tally_core::posting::{PostingEvent, PostingService};
use tally_core::reconciliation::{
    BankRule, BankTransactionStatus, ColumnDetection, ColumnMapping, DocumentKind, DroppedRow,
    MatchCriteria, MatchDecision, MatchDocument, RawStatementRow, ReconciliationError,
    RuleEngine, RuleOutcome, TransitionEffect, check_amount, detect_columns, find_match,
    normalize_rows, parse_csv, read_headers,
};
use tally_shared::config::ReconciliationConfig;
use tally_shared::types::money::{from_minor_units, to_minor_units};
use tally_shared::types::{
    AccountId, BankTransactionId, ExpenseId, InvoiceId, MoneyError, OrganizationId, PageRequest,
};
use uuid::Uuid;

use super::account;
use super::audit::AuditRepository;
use super::bank_rule;
use super::error::RepositoryError;
use super::expense::{self, ExpenseRepository};
use super::invoice::{self, InvoiceRepository};
use super::organization::require;
use super::posting::PostingRepository;
use crate::begin_serializable;
use crate::entities::{accounts, bank_transactions, expenses, invoices};

const ENTITY: &str = "Bank transaction";

/// Filter options for listing bank transactions.
#[derive(Debug, Clone, Default)]
pub struct BankTransactionFilter {
    /// Only lines imported into this account.
    pub account_id: Option<AccountId>,
    /// Only lines in this status.
    pub status: Option<BankTransactionStatus>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
}

/// Input for a manual status change.
#[derive(Debug, Clone)]
pub struct StatusChangeInput {
    /// Target status; Matched is reached through matching only.
    pub status: BankTransactionStatus,
    /// Category account; falls back to the one a rule suggested.
    pub category_account: Option<AccountId>,
    /// Payee to record.
    pub payee: Option<String>,
    /// Memo to record.
    pub memo: Option<String>,
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// New lines stored.
    pub imported: usize,
    /// Lines already present.
    pub skipped: usize,
    /// Rows that could not be read.
    pub dropped: Vec<DroppedRow>,
}

/// Result of running the bank rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRunSummary {
    /// Lines awaiting review that were evaluated.
    pub examined: usize,
    /// Lines that received a suggestion.
    pub suggested: usize,
    /// Lines categorized and posted.
    pub categorized: usize,
}

/// Result of automatic matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMatchSummary {
    /// Lines matched to a document.
    pub matched: usize,
    /// Lines with several equally good candidates.
    pub ambiguous: usize,
    /// Lines with no candidate.
    pub unmatched: usize,
}

/// Bank transaction repository.
#[derive(Debug, Clone)]
pub struct BankTransactionRepository {
    db: DatabaseConnection,
    config: ReconciliationConfig,
}

impl BankTransactionRepository {
    /// Creates a new bank transaction repository with default thresholds.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: ReconciliationConfig::default(),
        }
    }

    /// Uses the given import limit and matching thresholds.
    #[must_use]
    pub fn with_config(mut self, config: ReconciliationConfig) -> Self {
        self.config = config;
        self
    }

    // ========== Queries ==========

    /// Lists bank transactions, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        filter: &BankTransactionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<bank_transactions::Model>, u64), RepositoryError> {
        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(account_id) = filter.account_id {
            query = query.filter(bank_transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(bank_transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(bank_transactions::Column::TxnDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bank_transactions::Column::TxnDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(bank_transactions::Column::TxnDate)
            .order_by_asc(bank_transactions::Column::Description)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Gets a bank transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        transaction_id: BankTransactionId,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        find(&self.db, organization_id, transaction_id).await
    }

    /// Detects the columns of a CSV statement without importing it.
    ///
    /// # Errors
    ///
    /// Returns `Csv` if the header row cannot be read.
    pub fn preview_csv(csv_text: &str) -> Result<ColumnDetection, RepositoryError> {
        let headers = read_headers(csv_text)?;
        Ok(detect_columns(&headers))
    }

    // ========== Import ==========

    /// Imports a CSV statement using a confirmed column mapping.
    ///
    /// # Errors
    ///
    /// Returns `ColumnMapping`, `Csv`, or any error from [`Self::import`].
    pub async fn import_csv(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
        csv_text: &str,
        mapping: &ColumnMapping,
    ) -> Result<ImportSummary, RepositoryError> {
        let parsed = parse_csv(csv_text, mapping)?;
        let raws: Vec<RawStatementRow> = parsed
            .rows
            .into_iter()
            .map(|row| RawStatementRow {
                date: row.date.to_string(),
                description: row.description,
                amount: row.amount.to_string(),
            })
            .collect();

        let mut summary = self.import(organization_id, actor, account_id, &raws).await?;
        let mut dropped = parsed.dropped;
        dropped.append(&mut summary.dropped);
        summary.dropped = dropped;
        Ok(summary)
    }

    /// Imports statement rows into a bank or credit card account.
    ///
    /// Rows already stored for the same account, date, description and
    /// amount are skipped, as are repeats within the batch.
    ///
    /// # Errors
    ///
    /// Returns `TooManyRows`, `NotFound`, `NotBankAccount`, or a database
    /// error.
    pub async fn import(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
        rows: &[RawStatementRow],
    ) -> Result<ImportSummary, RepositoryError> {
        if rows.len() > self.config.max_import_rows {
            return Err(ReconciliationError::TooManyRows {
                count: rows.len(),
                max: self.config.max_import_rows,
            }
            .into());
        }
        let parsed = normalize_rows(rows);

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        let bank = bank_account(&txn, organization_id, account_id).await?;

        let mut summary = ImportSummary {
            dropped: parsed.dropped,
            ..ImportSummary::default()
        };
        let mut delta: i64 = 0;
        let now = Utc::now().into();

        for row in &parsed.rows {
            let amount_minor = to_minor_units(row.amount)?;
            let model = bank_transactions::ActiveModel {
                id: Set(BankTransactionId::new().into_inner()),
                organization_id: Set(organization_id.into_inner()),
                account_id: Set(bank.id),
                txn_date: Set(row.date),
                description: Set(row.description.clone()),
                amount_minor: Set(amount_minor),
                status: Set(BankTransactionStatus::ForReview.as_str().to_string()),
                category_account_id: Set(None),
                payee: Set(None),
                memo: Set(None),
                rule_id: Set(None),
                journal_entry_id: Set(None),
                matched_kind: Set(None),
                matched_id: Set(None),
                reconciliation_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };

            let inserted = bank_transactions::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        bank_transactions::Column::AccountId,
                        bank_transactions::Column::TxnDate,
                        bank_transactions::Column::Description,
                        bank_transactions::Column::AmountMinor,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;

            if inserted == 0 {
                summary.skipped += 1;
            } else {
                summary.imported += 1;
                delta = delta
                    .checked_add(amount_minor)
                    .ok_or(MoneyError::OutOfRange(row.amount))?;
            }
        }

        let balance = bank
            .bank_balance_minor
            .unwrap_or(0)
            .checked_add(delta)
            .ok_or(MoneyError::OutOfRange(from_minor_units(delta)))?;
        let mut active: accounts::ActiveModel = bank.into();
        active.bank_balance_minor = Set(Some(balance));
        active.updated_at = Set(now);
        let bank = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Import,
                EntityType::Account,
                bank.id,
                json!({
                    "imported": summary.imported,
                    "skipped": summary.skipped,
                    "dropped": summary.dropped.len(),
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            account_id = %bank.id,
            imported = summary.imported,
            skipped = summary.skipped,
            dropped = summary.dropped.len(),
            "Bank statement imported"
        );
        Ok(summary)
    }

    // ========== Review ==========

    /// Changes the review status of a line.
    ///
    /// Categorizing posts the line against its category account; moving a
    /// categorized line back to review reverses that entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition`, `MatchRequiresDocument`,
    /// `MissingCategory`, a posting error, or a database error.
    pub async fn set_status(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        transaction_id: BankTransactionId,
        input: StatusChangeInput,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, transaction_id).await?;
        let from = existing.status()?;
        let effect = from.transition(input.status)?;

        let updated = match effect {
            TransitionEffect::Post => {
                let category = input
                    .category_account
                    .or_else(|| existing.category_account_id.map(AccountId::from_uuid))
                    .ok_or(ReconciliationError::MissingCategory)?;
                categorize(
                    &txn,
                    organization_id,
                    actor,
                    existing,
                    category,
                    input.payee,
                    input.memo,
                )
                .await?
            }
            TransitionEffect::Reverse => {
                uncategorize(&txn, organization_id, actor, existing).await?
            }
            TransitionEffect::None => {
                let mut active: bank_transactions::ActiveModel = existing.into();
                active.status = Set(input.status.as_str().to_string());
                if input.payee.is_some() {
                    active.payee = Set(input.payee);
                }
                if input.memo.is_some() {
                    active.memo = Set(input.memo);
                }
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?
            }
            TransitionEffect::Match | TransitionEffect::ReverseThenMatch => {
                return Err(ReconciliationError::MatchRequiresDocument.into());
            }
        };

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::status_change(input.status.as_str()),
                EntityType::BankTransaction,
                updated.id,
                json!({
                    "from": from.as_str(),
                    "to": input.status.as_str(),
                    "categoryAccountId": updated.category_account_id,
                    "journalEntryId": updated.journal_entry_id,
                }),
            ),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            transaction_id = %updated.id,
            from = %from,
            to = %input.status,
            "Bank transaction status changed"
        );
        Ok(updated)
    }

    /// Runs the active bank rules over lines awaiting review.
    ///
    /// A rule that matches assigns its account and payee; an auto-confirm
    /// rule with an account also categorizes the line. Lines a rule would
    /// leave unchanged are not touched, so running twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for unreadable stored rules, a posting error, or a
    /// database error.
    pub async fn apply_rules(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: Option<AccountId>,
    ) -> Result<RuleRunSummary, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;

        let rules = bank_rule::load(&txn, organization_id)
            .await?
            .iter()
            .map(|model| model.rule())
            .collect::<Result<Vec<BankRule>, _>>()?;
        let engine = RuleEngine::new(&rules);

        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(
                bank_transactions::Column::Status.eq(BankTransactionStatus::ForReview.as_str()),
            );
        if let Some(account_id) = account_id {
            query = query.filter(bank_transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        let pending = query
            .order_by_asc(bank_transactions::Column::TxnDate)
            .order_by_asc(bank_transactions::Column::Description)
            .all(&txn)
            .await?;

        let mut summary = RuleRunSummary::default();
        for row in pending {
            summary.examined += 1;
            let outcome = engine.evaluate(row.status()?, &row.description, row.amount());

            let updated = match outcome {
                RuleOutcome::NoMatch => continue,
                RuleOutcome::Confirmed {
                    rule_id,
                    account,
                    payee,
                } if !row.amount().is_zero() => {
                    let mut row = row;
                    row.rule_id = Some(rule_id.into_inner());
                    let categorized =
                        categorize(&txn, organization_id, actor, row, account, payee, None).await?;
                    summary.categorized += 1;
                    categorized
                }
                RuleOutcome::Confirmed {
                    rule_id,
                    account,
                    payee,
                } => {
                    let Some(suggested) =
                        suggest(&txn, row, rule_id.into_inner(), Some(account), payee).await?
                    else {
                        continue;
                    };
                    summary.suggested += 1;
                    suggested
                }
                RuleOutcome::Suggested {
                    rule_id,
                    account,
                    payee,
                } => {
                    let Some(suggested) =
                        suggest(&txn, row, rule_id.into_inner(), account, payee).await?
                    else {
                        continue;
                    };
                    summary.suggested += 1;
                    suggested
                }
            };

            AuditRepository::record_in_txn(
                &txn,
                organization_id,
                actor,
                NewAuditEntry::new(
                    AuditAction::ApplyRule,
                    EntityType::BankTransaction,
                    updated.id,
                    json!({
                        "ruleId": updated.rule_id,
                        "status": updated.status,
                        "categoryAccountId": updated.category_account_id,
                        "payee": updated.payee,
                    }),
                ),
            )
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            examined = summary.examined,
            suggested = summary.suggested,
            categorized = summary.categorized,
            "Bank rules applied"
        );
        Ok(summary)
    }

    // ========== Matching ==========

    /// Matches lines awaiting review in one account to open documents.
    ///
    /// Each document is matched at most once per run. Ambiguous lines are
    /// left for manual review.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotBankAccount`, an invoice or expense error, a
    /// posting error, or a database error.
    pub async fn auto_match(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        account_id: AccountId,
    ) -> Result<AutoMatchSummary, RepositoryError> {
        let criteria = MatchCriteria::from(&self.config);
        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        let bank = bank_account(&txn, organization_id, account_id).await?;
        let mut documents = open_documents(&txn, organization_id, bank.id).await?;

        let pending = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(bank_transactions::Column::AccountId.eq(bank.id))
            .filter(bank_transactions::Column::Status.eq(BankTransactionStatus::ForReview.as_str()))
            .order_by_asc(bank_transactions::Column::TxnDate)
            .order_by_asc(bank_transactions::Column::Description)
            .all(&txn)
            .await?;

        let mut summary = AutoMatchSummary::default();
        for row in pending {
            match find_match(&row.line(), &documents, &criteria) {
                MatchDecision::NoCandidate => summary.unmatched += 1,
                MatchDecision::Ambiguous { candidates } => {
                    tracing::debug!(
                        transaction_id = %row.id,
                        candidates,
                        "Ambiguous bank match left for review"
                    );
                    summary.ambiguous += 1;
                }
                MatchDecision::Matched(document) => {
                    documents.retain(|d| !(d.kind == document.kind && d.id == document.id));
                    let matched =
                        apply_match(&txn, organization_id, actor, row, &document).await?;
                    record_match(&txn, organization_id, actor, &matched, &document).await?;
                    summary.matched += 1;
                }
            }
        }

        txn.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            account_id = %account_id,
            matched = summary.matched,
            ambiguous = summary.ambiguous,
            unmatched = summary.unmatched,
            "Bank lines auto-matched"
        );
        Ok(summary)
    }

    /// Matches one line to a chosen document.
    ///
    /// The amount must still fit; a categorized line has its entry reversed
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition`, `CriteriaNotMet`, an invoice
    /// or expense error, a posting error, or a database error.
    pub async fn match_document(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        transaction_id: BankTransactionId,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find(&txn, organization_id, transaction_id).await?;
        existing.status()?.transition(BankTransactionStatus::Matched)?;

        let document = match kind {
            DocumentKind::Invoice => {
                let model =
                    invoice::find(&txn, organization_id, InvoiceId::from_uuid(document_id)).await?;
                invoice_document(&model)?
            }
            DocumentKind::Expense | DocumentKind::Bill => {
                let model =
                    expense::find(&txn, organization_id, ExpenseId::from_uuid(document_id)).await?;
                expense_document(&model)?.filter(|d| d.kind == kind)
            }
        }
        .ok_or_else(|| {
            ReconciliationError::CriteriaNotMet(format!(
                "{} {document_id} is not open for matching",
                kind.as_str()
            ))
        })?;
        check_amount(&existing.line(), &document)?;

        let matched = apply_match(&txn, organization_id, actor, existing, &document).await?;
        record_match(&txn, organization_id, actor, &matched, &document).await?;

        txn.commit().await?;
        Ok(matched)
    }
}

/// Loads a bank transaction of the organization.
pub(crate) async fn find<C: sea_orm::ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    transaction_id: BankTransactionId,
) -> Result<bank_transactions::Model, RepositoryError> {
    bank_transactions::Entity::find_by_id(transaction_id.into_inner())
        .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found(ENTITY, transaction_id))
}

/// Loads an account and checks it takes statement imports.
pub(crate) async fn bank_account(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    account_id: AccountId,
) -> Result<accounts::Model, RepositoryError> {
    let account = account::find(txn, organization_id, account_id).await?;
    if account.account_type()?.is_bank_like() {
        Ok(account)
    } else {
        Err(ReconciliationError::NotBankAccount.into())
    }
}

async fn categorize(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: &str,
    existing: bank_transactions::Model,
    category: AccountId,
    payee: Option<String>,
    memo: Option<String>,
) -> Result<bank_transactions::Model, RepositoryError> {
    account::find(txn, organization_id, category).await?;
    let event = PostingEvent::BankTransactionCategorized {
        transaction_id: BankTransactionId::from_uuid(existing.id),
        date: existing.txn_date,
        description: existing.description.clone(),
        bank_account: AccountId::from_uuid(existing.account_id),
        category_account: category,
        amount: existing.amount(),
    };
    let plan = PostingService::plan(&event)?;
    let posted = PostingRepository::post_in_txn(txn, organization_id, actor, &plan).await?;

    let rule_id = existing.rule_id;
    let mut active: bank_transactions::ActiveModel = existing.into();
    active.status = Set(BankTransactionStatus::Categorized.as_str().to_string());
    active.category_account_id = Set(Some(category.into_inner()));
    active.rule_id = Set(rule_id);
    active.journal_entry_id = Set(Some(posted.entry.id));
    if payee.is_some() {
        active.payee = Set(payee);
    }
    if memo.is_some() {
        active.memo = Set(memo);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn uncategorize(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: &str,
    existing: bank_transactions::Model,
) -> Result<bank_transactions::Model, RepositoryError> {
    if let Some(entry_id) = existing.journal_entry_id {
        PostingRepository::reverse_in_txn(
            txn,
            organization_id,
            actor,
            entry_id,
            None,
            "Bank transaction categorization undone",
        )
        .await?;
    }

    let mut active: bank_transactions::ActiveModel = existing.into();
    active.status = Set(BankTransactionStatus::ForReview.as_str().to_string());
    active.journal_entry_id = Set(None);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Stores a rule's suggestion; `None` when the line already carries it.
async fn suggest(
    txn: &DatabaseTransaction,
    existing: bank_transactions::Model,
    rule_id: Uuid,
    account: Option<AccountId>,
    payee: Option<String>,
) -> Result<Option<bank_transactions::Model>, RepositoryError> {
    let category = account.map(AccountId::into_inner).or(existing.category_account_id);
    let payee = payee.or_else(|| existing.payee.clone());
    if existing.rule_id == Some(rule_id)
        && existing.category_account_id == category
        && existing.payee == payee
    {
        return Ok(None);
    }

    let mut active: bank_transactions::ActiveModel = existing.into();
    active.rule_id = Set(Some(rule_id));
    active.category_account_id = Set(category);
    active.payee = Set(payee);
    active.updated_at = Set(Utc::now().into());
    Ok(Some(active.update(txn).await?))
}

async fn apply_match(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: &str,
    existing: bank_transactions::Model,
    document: &MatchDocument,
) -> Result<bank_transactions::Model, RepositoryError> {
    let existing = if existing.status()? == BankTransactionStatus::Categorized {
        uncategorize(txn, organization_id, actor, existing).await?
    } else {
        existing
    };
    let bank = AccountId::from_uuid(existing.account_id);

    match document.kind {
        DocumentKind::Invoice => {
            let model =
                invoice::find(txn, organization_id, InvoiceId::from_uuid(document.id)).await?;
            let update = InvoiceUpdate {
                status: Some(InvoiceStatus::Deposited),
                payment_amount: None,
                deposit_account: Some(bank),
                amounts: None,
                effective_date: Some(existing.txn_date),
            };
            InvoiceRepository::update_in_txn(
                txn,
                organization_id,
                actor,
                model,
                &update,
                Utc::now().date_naive(),
            )
            .await?;
        }
        DocumentKind::Expense => {
            let model =
                expense::find(txn, organization_id, ExpenseId::from_uuid(document.id)).await?;
            ExpenseRepository::link_transaction_in_txn(txn, model, existing.id).await?;
        }
        DocumentKind::Bill => {
            let model =
                expense::find(txn, organization_id, ExpenseId::from_uuid(document.id)).await?;
            let (paid, _) = ExpenseRepository::pay_bill_in_txn(
                txn,
                organization_id,
                actor,
                model,
                bank,
                existing.txn_date,
            )
            .await?;
            ExpenseRepository::link_transaction_in_txn(txn, paid, existing.id).await?;
        }
    }

    let mut active: bank_transactions::ActiveModel = existing.into();
    active.status = Set(BankTransactionStatus::Matched.as_str().to_string());
    active.matched_kind = Set(Some(document.kind.as_str().to_string()));
    active.matched_id = Set(Some(document.id));
    if document.kind != DocumentKind::Invoice {
        active.payee = Set(Some(document.counterparty.clone()));
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn record_match(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: &str,
    matched: &bank_transactions::Model,
    document: &MatchDocument,
) -> Result<(), RepositoryError> {
    AuditRepository::record_in_txn(
        txn,
        organization_id,
        actor,
        NewAuditEntry::new(
            AuditAction::Match,
            EntityType::BankTransaction,
            matched.id,
            json!({
                "documentKind": document.kind.as_str(),
                "documentId": document.id,
                "documentNumber": document.number,
                "amount": document.amount,
            }),
        ),
    )
    .await?;
    Ok(())
}

/// Documents a line in the given account may match.
///
/// Expenses count only when paid from that account; bills and invoices
/// count regardless.
async fn open_documents(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    bank_account_id: Uuid,
) -> Result<Vec<MatchDocument>, RepositoryError> {
    let open: Vec<&str> = [
        InvoiceStatus::Sent,
        InvoiceStatus::Viewed,
        InvoiceStatus::Partial,
        InvoiceStatus::Overdue,
    ]
    .iter()
    .map(|s| s.as_str())
    .collect();

    let invoices = invoices::Entity::find()
        .filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(invoices::Column::Status.is_in(open))
        .order_by_asc(invoices::Column::InvoiceNumber)
        .all(txn)
        .await?;

    let expenses = expenses::Entity::find()
        .filter(expenses::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(expenses::Column::MatchedTransactionId.is_null())
        .order_by_asc(expenses::Column::ExpenseDate)
        .all(txn)
        .await?;

    let mut documents = Vec::with_capacity(invoices.len() + expenses.len());
    for model in &invoices {
        documents.extend(invoice_document(model)?);
    }
    for model in &expenses {
        let is_bill = model.expense_type()? == ExpenseType::Bill;
        if is_bill || model.payment_account_id == Some(bank_account_id) {
            documents.extend(expense_document(model)?);
        }
    }
    Ok(documents)
}

fn invoice_document(model: &invoices::Model) -> Result<Option<MatchDocument>, RepositoryError> {
    if !model.status()?.is_open() {
        return Ok(None);
    }
    Ok(Some(MatchDocument {
        kind: DocumentKind::Invoice,
        id: model.id,
        number: Some(model.invoice_number.clone()),
        counterparty: model.customer.clone(),
        dates: vec![model.issue_date, model.due_date],
        amount: from_minor_units(model.amount_due_minor),
    }))
}

fn expense_document(model: &expenses::Model) -> Result<Option<MatchDocument>, RepositoryError> {
    if model.matched_transaction_id.is_some() {
        return Ok(None);
    }
    let kind = match model.expense_type()? {
        ExpenseType::Bill if model.is_paid => return Ok(None),
        ExpenseType::Bill => DocumentKind::Bill,
        ExpenseType::Expense | ExpenseType::Cheque => DocumentKind::Expense,
    };
    Ok(Some(MatchDocument {
        kind,
        id: model.id,
        number: None,
        counterparty: model.payee.clone(),
        dates: vec![model.expense_date],
        amount: from_minor_units(model.total_minor),
    }))
}
