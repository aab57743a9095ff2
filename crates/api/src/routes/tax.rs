//! Tax rate and filing routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::tax::TaxFilingStatus;
use tally_db::{
    entities::{tax_filings, tax_rates},
    repositories::{CreateTaxRateInput, PrepareFilingInput, TaxRepository},
};
use tally_shared::types::{OrganizationId, money::from_minor_units};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::Actor};

/// Creates the tax routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/tax-rates",
            get(list_rates).post(create_rate),
        )
        .route(
            "/organizations/{org_id}/tax-rates/{code}/deactivate",
            post(deactivate_rate),
        )
        .route(
            "/organizations/{org_id}/tax-filings",
            get(list_filings).post(prepare_filing),
        )
        .route(
            "/organizations/{org_id}/tax-filings/{filing_id}/status",
            patch(update_filing_status),
        )
}

/// Request body for creating a tax rate.
#[derive(Debug, Deserialize)]
pub struct CreateTaxRateRequest {
    /// Lookup code, e.g. `PST-BC`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Rate in percent.
    pub rate: Decimal,
    /// Collecting agency.
    pub agency: String,
}

/// Request body for preparing a filing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareFilingRequest {
    /// Collecting agency.
    pub agency: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Manual adjustment added to the net tax.
    #[serde(default)]
    pub adjustment: Decimal,
}

/// Request body for advancing a filing.
#[derive(Debug, Deserialize)]
pub struct FilingStatusRequest {
    /// Next status.
    pub status: TaxFilingStatus,
}

/// Response for a tax rate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateResponse {
    /// Rate ID.
    pub id: Uuid,
    /// Lookup code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Rate in percent.
    pub rate: Decimal,
    /// Collecting agency.
    pub agency: String,
    /// Whether the rate can be applied.
    pub is_active: bool,
}

impl From<tax_rates::Model> for TaxRateResponse {
    fn from(model: tax_rates::Model) -> Self {
        let rate = model.rate();
        Self {
            id: model.id,
            code: rate.code,
            name: rate.name,
            rate: rate.rate,
            agency: rate.agency,
            is_active: rate.is_active,
        }
    }
}

/// Response for a tax filing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxFilingResponse {
    /// Filing ID.
    pub id: Uuid,
    /// Collecting agency.
    pub agency: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Tax collected on sales.
    pub collected: Decimal,
    /// Tax paid on purchases.
    pub paid: Decimal,
    /// Manual adjustment.
    pub adjustment: Decimal,
    /// Amount owed to (or refunded by) the agency.
    pub net_tax: Decimal,
    /// Filing status.
    pub status: String,
}

impl From<tax_filings::Model> for TaxFilingResponse {
    fn from(model: tax_filings::Model) -> Self {
        Self {
            id: model.id,
            agency: model.agency,
            period_start: model.period_start,
            period_end: model.period_end,
            collected: from_minor_units(model.collected_minor),
            paid: from_minor_units(model.paid_minor),
            adjustment: from_minor_units(model.adjustment_minor),
            net_tax: from_minor_units(model.net_tax_minor),
            status: model.status,
        }
    }
}

/// GET `/organizations/{org_id}/tax-rates`
async fn list_rates(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<TaxRateResponse>>> {
    let repo = TaxRepository::new((*state.db).clone());
    let rates = repo.list_rates(org_id).await?;
    Ok(Json(rates.into_iter().map(Into::into).collect()))
}

/// POST `/organizations/{org_id}/tax-rates`
async fn create_rate(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<CreateTaxRateRequest>,
) -> ApiResult<(StatusCode, Json<TaxRateResponse>)> {
    let repo = TaxRepository::new((*state.db).clone());
    let input = CreateTaxRateInput {
        code: payload.code,
        name: payload.name,
        rate: payload.rate,
        agency: payload.agency,
    };
    let rate = repo.create_rate(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(rate.into())))
}

/// POST `/organizations/{org_id}/tax-rates/{code}/deactivate`
async fn deactivate_rate(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, code)): Path<(OrganizationId, String)>,
) -> ApiResult<Json<TaxRateResponse>> {
    let repo = TaxRepository::new((*state.db).clone());
    let rate = repo.deactivate_rate(org_id, actor.name(), &code).await?;
    Ok(Json(rate.into()))
}

/// GET `/organizations/{org_id}/tax-filings`
async fn list_filings(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<TaxFilingResponse>>> {
    let repo = TaxRepository::new((*state.db).clone());
    let filings = repo.list_filings(org_id).await?;
    Ok(Json(filings.into_iter().map(Into::into).collect()))
}

/// POST `/organizations/{org_id}/tax-filings` - Prepare a filing from posted tax.
async fn prepare_filing(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Json(payload): Json<PrepareFilingRequest>,
) -> ApiResult<(StatusCode, Json<TaxFilingResponse>)> {
    let repo = TaxRepository::new((*state.db).clone());
    let input = PrepareFilingInput {
        agency: payload.agency,
        period_start: payload.period_start,
        period_end: payload.period_end,
        adjustment: payload.adjustment,
    };
    let filing = repo.prepare_filing(org_id, actor.name(), input).await?;
    Ok((StatusCode::CREATED, Json(filing.into())))
}

/// PATCH `/organizations/{org_id}/tax-filings/{filing_id}/status`
async fn update_filing_status(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, filing_id)): Path<(OrganizationId, Uuid)>,
    Json(payload): Json<FilingStatusRequest>,
) -> ApiResult<Json<TaxFilingResponse>> {
    let repo = TaxRepository::new((*state.db).clone());
    let filing = repo
        .update_filing_status(org_id, actor.name(), filing_id, payload.status)
        .await?;
    Ok(Json(filing.into()))
}
