//! Report and chart routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tally_core::{
    reports::{
        AgingReport, BalanceSheet, GeneralLedger, MonthlyBalanceSheet, MonthlyPnl, PartyBalance,
        ProfitAndLoss, TrialBalance,
    },
    tax::TaxSummary,
};
use tally_db::ReportRepository;
use tally_shared::types::{AccountId, OrganizationId};

use crate::{AppState, error::ApiResult};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/reports/profit-and-loss",
            get(get_profit_and_loss),
        )
        .route(
            "/organizations/{org_id}/reports/balance-sheet",
            get(get_balance_sheet),
        )
        .route(
            "/organizations/{org_id}/reports/trial-balance",
            get(get_trial_balance),
        )
        .route(
            "/organizations/{org_id}/reports/tax-summary",
            get(get_tax_summary),
        )
        .route(
            "/organizations/{org_id}/reports/general-ledger",
            get(get_general_ledger),
        )
        .route(
            "/organizations/{org_id}/reports/aging-receivable",
            get(get_aging_receivable),
        )
        .route(
            "/organizations/{org_id}/reports/aging-payable",
            get(get_aging_payable),
        )
        .route(
            "/organizations/{org_id}/reports/customer-balances",
            get(get_customer_balances),
        )
        .route(
            "/organizations/{org_id}/reports/supplier-balances",
            get(get_supplier_balances),
        )
        .route(
            "/organizations/{org_id}/charts/monthly-pnl",
            get(get_monthly_pnl),
        )
        .route(
            "/organizations/{org_id}/charts/monthly-balance-sheet",
            get(get_monthly_balance_sheet),
        )
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for period reports.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// First day (defaults to January 1 of the end date's year).
    pub start_date: Option<NaiveDate>,
    /// Last day (defaults to today).
    pub end_date: Option<NaiveDate>,
}

impl PeriodQuery {
    fn resolve(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or_else(today);
        let start = self
            .start_date
            .or_else(|| NaiveDate::from_ymd_opt(end.year(), 1, 1))
            .unwrap_or(end);
        (start, end)
    }
}

/// Query parameters for the general ledger.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// First day (defaults to January 1 of the end date's year).
    pub start_date: Option<NaiveDate>,
    /// Last day (defaults to today).
    pub end_date: Option<NaiveDate>,
    /// Only this account.
    pub account_id: Option<AccountId>,
}

/// Query parameters for point-in-time reports.
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    /// As of date (defaults to today).
    pub as_of: Option<NaiveDate>,
}

/// Query parameters for yearly charts.
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    /// Calendar year (defaults to the current year).
    pub year: Option<i32>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/organizations/{org_id}/reports/profit-and-loss`
async fn get_profit_and_loss(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<ProfitAndLoss>> {
    let (start, end) = query.resolve();
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.profit_and_loss(org_id, start, end).await?))
}

/// GET `/organizations/{org_id}/reports/balance-sheet`
async fn get_balance_sheet(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<BalanceSheet>> {
    let repo = ReportRepository::new((*state.db).clone());
    let as_of = query.as_of.unwrap_or_else(today);
    Ok(Json(repo.balance_sheet(org_id, as_of).await?))
}

/// GET `/organizations/{org_id}/reports/trial-balance`
async fn get_trial_balance(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<TrialBalance>> {
    let repo = ReportRepository::new((*state.db).clone());
    let as_of = query.as_of.unwrap_or_else(today);
    Ok(Json(repo.trial_balance(org_id, as_of).await?))
}

/// GET `/organizations/{org_id}/reports/tax-summary` - Collected vs. paid per agency.
async fn get_tax_summary(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<TaxSummary>> {
    let (start, end) = query.resolve();
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.tax_summary(org_id, start, end).await?))
}

/// GET `/organizations/{org_id}/reports/general-ledger` - Lines per account with running balance.
async fn get_general_ledger(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Json<GeneralLedger>> {
    let period = PeriodQuery {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (start, end) = period.resolve();
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.general_ledger(org_id, start, end, query.account_id).await?))
}

/// GET `/organizations/{org_id}/reports/aging-receivable`
async fn get_aging_receivable(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<AgingReport>> {
    let repo = ReportRepository::new((*state.db).clone());
    let as_of = query.as_of.unwrap_or_else(today);
    Ok(Json(repo.aging_receivable(org_id, as_of).await?))
}

/// GET `/organizations/{org_id}/reports/aging-payable`
async fn get_aging_payable(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<AgingReport>> {
    let repo = ReportRepository::new((*state.db).clone());
    let as_of = query.as_of.unwrap_or_else(today);
    Ok(Json(repo.aging_payable(org_id, as_of).await?))
}

/// GET `/organizations/{org_id}/reports/customer-balances`
async fn get_customer_balances(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<PartyBalance>>> {
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.customer_balances(org_id).await?))
}

/// GET `/organizations/{org_id}/reports/supplier-balances`
async fn get_supplier_balances(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
) -> ApiResult<Json<Vec<PartyBalance>>> {
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.supplier_balances(org_id).await?))
}

/// GET `/organizations/{org_id}/charts/monthly-pnl`
async fn get_monthly_pnl(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<MonthlyPnl>> {
    let repo = ReportRepository::new((*state.db).clone());
    let year = query.year.unwrap_or_else(|| today().year());
    Ok(Json(repo.monthly_profit_and_loss(org_id, year).await?))
}

/// GET `/organizations/{org_id}/charts/monthly-balance-sheet`
async fn get_monthly_balance_sheet(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<MonthlyBalanceSheet>> {
    let repo = ReportRepository::new((*state.db).clone());
    let year = query.year.unwrap_or_else(|| today().year());
    Ok(Json(repo.monthly_balance_sheet(org_id, year).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_defaults_to_year_to_date() {
        let query = PeriodQuery {
            start_date: None,
            end_date: Some(date(2026, 8, 15)),
        };
        assert_eq!(query.resolve(), (date(2026, 1, 1), date(2026, 8, 15)));
    }

    #[test]
    fn test_period_keeps_explicit_bounds() {
        let query = PeriodQuery {
            start_date: Some(date(2026, 3, 1)),
            end_date: Some(date(2026, 3, 31)),
        };
        assert_eq!(query.resolve(), (date(2026, 3, 1), date(2026, 3, 31)));
    }
}
