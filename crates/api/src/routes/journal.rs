//! Journal routes: entries, manual adjustments, transfers, reversals.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{EntrySource, JournalLineInput};
use tally_db::{
    entities::{journal_entries, journal_lines},
    repositories::{
        JournalFilter, JournalRepository, ManualEntryInput, PostedJournal, TransferInput,
    },
};
use tally_shared::types::{AccountId, JournalEntryId, OrganizationId, PageRequest, PageResponse};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/{org_id}/journal", get(list_entries))
        .route("/organizations/{org_id}/journal/manual", post(post_manual))
        .route("/organizations/{org_id}/journal/transfers", post(post_transfer))
        .route("/organizations/{org_id}/journal/{entry_id}", get(get_entry))
        .route(
            "/organizations/{org_id}/journal/{entry_id}/reverse",
            post(reverse_entry),
        )
}

/// Query parameters for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Only entries from this source.
    pub source: Option<EntrySource>,
    /// Entries dated on or after.
    pub from: Option<NaiveDate>,
    /// Entries dated on or before.
    pub to: Option<NaiveDate>,
}

/// One line of a manual entry request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
}

/// Request body for a manual adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryRequest {
    /// Posting date.
    pub date: NaiveDate,
    /// Entry memo.
    pub memo: String,
    /// Balanced lines.
    pub lines: Vec<LineRequest>,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Posting date.
    pub date: NaiveDate,
    /// Account the money leaves.
    pub from_account: AccountId,
    /// Account the money arrives in.
    pub to_account: AccountId,
    /// Amount moved.
    pub amount: Decimal,
    /// Memo.
    pub memo: Option<String>,
}

/// Request body for a reversal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseRequest {
    /// Reversal date; the original date when absent.
    pub date: Option<NaiveDate>,
    /// Why the entry is reversed.
    pub reason: String,
}

/// Response for a journal line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    /// Account posted to.
    pub account_id: Uuid,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
}

impl From<journal_lines::Model> for LineResponse {
    fn from(model: journal_lines::Model) -> Self {
        Self {
            account_id: model.account_id,
            debit: model.debit(),
            credit: model.credit(),
            memo: model.memo,
        }
    }
}

/// Response for a journal entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Sequential number, e.g. `JE-0042`.
    pub entry_number: String,
    /// Posting date.
    pub entry_date: NaiveDate,
    /// Memo.
    pub memo: String,
    /// Origin of the entry.
    pub source: String,
    /// Document that caused the entry.
    pub source_id: Option<Uuid>,
    /// Entry this one reverses.
    pub reverses_entry_id: Option<Uuid>,
    /// Entry that reversed this one.
    pub reversed_by_entry_id: Option<Uuid>,
    /// Actor who posted.
    pub created_by: String,
    /// Posting timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Lines, present on single-entry responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<LineResponse>>,
}

impl From<journal_entries::Model> for EntryResponse {
    fn from(model: journal_entries::Model) -> Self {
        Self {
            id: model.id,
            entry_number: model.entry_number,
            entry_date: model.entry_date,
            memo: model.memo,
            source: model.source,
            source_id: model.source_id,
            reverses_entry_id: model.reverses_entry_id,
            reversed_by_entry_id: model.reversed_by_entry_id,
            created_by: model.created_by,
            created_at: model.created_at,
            lines: None,
        }
    }
}

impl From<PostedJournal> for EntryResponse {
    fn from(posted: PostedJournal) -> Self {
        let mut response = Self::from(posted.entry);
        response.lines = Some(posted.lines.into_iter().map(Into::into).collect());
        response
    }
}

/// GET `/organizations/{org_id}/journal` - Paginated entries, newest first.
async fn list_entries(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListEntriesQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<EntryResponse>>> {
    let repo = JournalRepository::new((*state.db).clone());
    let filter = JournalFilter {
        source: query.source,
        from: query.from,
        to: query.to,
    };
    let (entries, total) = repo.list(org_id, &filter, &page).await?;
    Ok(Json(PageResponse::new(
        entries.into_iter().map(Into::into).collect(),
        page.page,
        page.per_page,
        total,
    )))
}

/// GET `/organizations/{org_id}/journal/{entry_id}` - Entry with its lines.
async fn get_entry(
    State(state): State<AppState>,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
) -> ApiResult<Json<EntryResponse>> {
    let repo = JournalRepository::new((*state.db).clone());
    Ok(Json(repo.get(org_id, entry_id).await?.into()))
}

/// POST `/organizations/{org_id}/journal/manual`
async fn post_manual(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<ManualEntryRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let repo = JournalRepository::new((*state.db).clone());
    let input = ManualEntryInput {
        date: payload.date,
        memo: payload.memo,
        lines: payload
            .lines
            .into_iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                memo: line.memo,
            })
            .collect(),
    };
    let posted = repo.post_manual(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(posted.into())))
}

/// POST `/organizations/{org_id}/journal/transfers`
async fn post_transfer(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<TransferRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let repo = JournalRepository::new((*state.db).clone());
    let input = TransferInput {
        date: payload.date,
        from_account: payload.from_account,
        to_account: payload.to_account,
        amount: payload.amount,
        memo: payload.memo,
    };
    let posted = repo.post_transfer(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(posted.into())))
}

/// POST `/organizations/{org_id}/journal/{entry_id}/reverse`
async fn reverse_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
    Json(payload): Json<ReverseRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let repo = JournalRepository::new((*state.db).clone());
    let posted = repo
        .reverse(org_id, actor.name(), entry_id, payload.date, &payload.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(posted.into())))
}
