//! Tax rate and tax filing repository.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;
use tally_core::audit::{AuditAction, EntityType, NewAuditEntry};
use tally_core::reports::ReportService;
use tally_core::tax::{TaxError, TaxFiling, TaxFilingStatus, TaxRate, rate_to_thousandths};
use tally_shared::types::OrganizationId;
use tally_shared::types::money::{check_range, to_minor_units};
use uuid::Uuid;

use super::audit::AuditRepository;
use super::error::RepositoryError;
use super::organization::require;
use super::report::load_books;
use crate::begin_serializable;
use crate::entities::{tax_filings, tax_rates};

/// Input for creating a tax rate.
#[derive(Debug, Clone)]
pub struct CreateTaxRateInput {
    /// Code used at posting time, e.g. `HST-ON`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Rate in percent, up to three decimals.
    pub rate: Decimal,
    /// Collecting agency.
    pub agency: String,
}

/// Input for preparing a tax filing.
#[derive(Debug, Clone)]
pub struct PrepareFilingInput {
    /// Collecting agency.
    pub agency: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Manual adjustment added to the net tax.
    pub adjustment: Decimal,
}

/// Tax repository.
#[derive(Debug, Clone)]
pub struct TaxRepository {
    db: DatabaseConnection,
}

impl TaxRepository {
    /// Creates a new tax repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========== Rates ==========

    /// Lists the organization's tax rates by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_rates(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<tax_rates::Model>, RepositoryError> {
        Ok(tax_rates::Entity::find()
            .filter(tax_rates::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(tax_rates::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Creates a tax rate.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `InvalidRate`, `Conflict` for a taken code, or a
    /// database error.
    pub async fn create_rate(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: CreateTaxRateInput,
    ) -> Result<tax_rates::Model, RepositoryError> {
        let code = input.code.trim().to_uppercase();
        if code.is_empty() || input.name.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "tax rate code and name are required".to_string(),
            ));
        }
        let rate = TaxRate {
            code,
            name: input.name.trim().to_string(),
            rate: input.rate,
            agency: input.agency.trim().to_string(),
            is_active: true,
        };

        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;
        let model = Self::insert_rate_in_txn(&txn, organization_id, &rate).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Create,
                EntityType::TaxRate,
                model.id,
                json!({ "code": rate.code, "rate": rate.rate, "agency": rate.agency }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Deactivates a tax rate; it can no longer be applied.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRate` or a database error.
    pub async fn deactivate_rate(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        code: &str,
    ) -> Result<tax_rates::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = find_rate(&txn, organization_id, code)
            .await?
            .ok_or_else(|| TaxError::UnknownRate(code.to_string()))?;

        let mut active: tax_rates::ActiveModel = existing.into();
        active.is_active = Set(false);
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::Update,
                EntityType::TaxRate,
                updated.id,
                json!({ "changes": [{ "field": "isActive", "before": true, "after": false }] }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Inserts a rate without auditing; used when seeding an organization.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate`, `Conflict` or a database error.
    pub async fn insert_rate_in_txn<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        rate: &TaxRate,
    ) -> Result<tax_rates::Model, RepositoryError> {
        let model = tax_rates::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            code: Set(rate.code.clone()),
            name: Set(rate.name.clone()),
            rate_thousandths: Set(rate_to_thousandths(rate.rate)?),
            agency: Set(rate.agency.clone()),
            is_active: Set(rate.is_active),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(|e| {
            RepositoryError::from_insert(e, format!("tax rate '{}' already exists", rate.code))
        })?;
        Ok(model)
    }

    /// Looks up a rate that may be applied at posting time.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRate` or `InactiveRate`.
    pub async fn find_active_rate<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        code: &str,
    ) -> Result<TaxRate, RepositoryError> {
        let rate = find_rate(conn, organization_id, code)
            .await?
            .ok_or_else(|| TaxError::UnknownRate(code.to_string()))?
            .rate();
        rate.ensure_active()?;
        Ok(rate)
    }

    // ========== Filings ==========

    /// Lists filings, most recent period first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_filings(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<tax_filings::Model>, RepositoryError> {
        Ok(tax_filings::Entity::find()
            .filter(tax_filings::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(tax_filings::Column::PeriodEnd)
            .all(&self.db)
            .await?)
    }

    /// Computes a filing from the ledger and stores it as upcoming.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod`, `InvalidDateRange` or a database error.
    pub async fn prepare_filing(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        input: PrepareFilingInput,
    ) -> Result<tax_filings::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        require(&txn, organization_id).await?;

        check_range(input.adjustment)?;
        let (accounts, lines) = load_books(&txn, organization_id).await?;
        let summary =
            ReportService::tax_summary(&accounts, &lines, input.period_start, input.period_end)?;
        let filing = TaxFiling::prepare(
            input.agency.trim(),
            input.period_start,
            input.period_end,
            summary,
            input.adjustment,
        )?;

        let now = Utc::now().into();
        let model = tax_filings::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            agency: Set(filing.agency.clone()),
            period_start: Set(filing.period_start),
            period_end: Set(filing.period_end),
            collected_minor: Set(to_minor_units(filing.collected)?),
            paid_minor: Set(to_minor_units(filing.paid)?),
            adjustment_minor: Set(to_minor_units(filing.adjustment)?),
            net_tax_minor: Set(to_minor_units(filing.net_tax)?),
            status: Set(filing.status.as_str().to_string()),
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
                EntityType::TaxFiling,
                model.id,
                serde_json::to_value(&filing)?,
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Moves a filing one step forward: upcoming, due, filed, paid.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` or a database error.
    pub async fn update_filing_status(
        &self,
        organization_id: OrganizationId,
        actor: &str,
        filing_id: Uuid,
        status: TaxFilingStatus,
    ) -> Result<tax_filings::Model, RepositoryError> {
        let txn = begin_serializable(&self.db).await?;
        let existing = tax_filings::Entity::find_by_id(filing_id)
            .filter(tax_filings::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Tax filing", filing_id))?;

        let from = existing.status()?;
        let to = from.transition(status)?;

        let mut active: tax_filings::ActiveModel = existing.into();
        active.status = Set(to.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::record_in_txn(
            &txn,
            organization_id,
            actor,
            NewAuditEntry::new(
                AuditAction::status_change(to.as_str()),
                EntityType::TaxFiling,
                updated.id,
                json!({ "from": from, "to": to }),
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }
}

async fn find_rate<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    code: &str,
) -> Result<Option<tax_rates::Model>, RepositoryError> {
    Ok(tax_rates::Entity::find()
        .filter(tax_rates::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(tax_rates::Column::Code.eq(code.trim().to_uppercase()))
        .one(conn)
        .await?)
}
