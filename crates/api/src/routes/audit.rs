//! Audit log routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tally_core::audit::{AuditFilter, AuditRecord, AuditSummary, ExportFormat};
use tally_db::AuditRepository;
use tally_shared::types::{OrganizationId, pagination::MAX_PER_PAGE};

use crate::{AppState, error::ApiResult};

const DEFAULT_LIMIT: u64 = 100;

/// Creates the audit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/{org_id}/audit", get(list_records))
        .route("/organizations/{org_id}/audit/summary", get(get_summary))
        .route("/organizations/{org_id}/audit/export", get(export_records))
}

/// Window over the filtered records, newest first.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// Maximum records returned.
    pub limit: Option<u64>,
    /// Records skipped.
    pub offset: Option<u64>,
}

/// Query parameters for exports.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// `csv` or `json` (defaults to `csv`).
    pub format: Option<ExportFormat>,
}

/// GET `/organizations/{org_id}/audit`
async fn list_records(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(filter): Query<AuditFilter>,
    Query(window): Query<WindowQuery>,
) -> ApiResult<Json<Vec<AuditRecord>>> {
    let repo = AuditRepository::new((*state.db).clone());
    let limit = window
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, u64::from(MAX_PER_PAGE));
    let records = repo
        .query(org_id, &filter, limit, window.offset.unwrap_or(0))
        .await?;
    Ok(Json(records))
}

/// GET `/organizations/{org_id}/audit/summary`
async fn get_summary(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(filter): Query<AuditFilter>,
) -> ApiResult<Json<AuditSummary>> {
    let repo = AuditRepository::new((*state.db).clone());
    Ok(Json(repo.summary(org_id, &filter).await?))
}

/// GET `/organizations/{org_id}/audit/export` - Download as CSV or JSON.
async fn export_records(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(filter): Query<AuditFilter>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let format = query.format.unwrap_or(ExportFormat::Csv);
    let repo = AuditRepository::new((*state.db).clone());
    let body = repo.export(org_id, &filter, format).await?;

    let filename = match format {
        ExportFormat::Csv => "audit-log.csv",
        ExportFormat::Json => "audit-log.json",
    };
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}
