//! `SeaORM` Entity for tax_filings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::tax::{TaxError, TaxFiling, TaxFilingStatus};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_filings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub agency: String,
    pub period_start: Date,
    pub period_end: Date,
    pub collected_minor: i64,
    pub paid_minor: i64,
    pub adjustment_minor: i64,
    pub net_tax_minor: i64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed status.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored label is not recognized.
    pub fn status(&self) -> Result<TaxFilingStatus, TaxError> {
        TaxFilingStatus::parse(&self.status)
            .ok_or_else(|| TaxError::UnknownStatus(self.status.clone()))
    }

    /// The filing in domain form.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored status is not recognized.
    pub fn filing(&self) -> Result<TaxFiling, TaxError> {
        Ok(TaxFiling {
            agency: self.agency.clone(),
            period_start: self.period_start,
            period_end: self.period_end,
            collected: from_minor_units(self.collected_minor),
            paid: from_minor_units(self.paid_minor),
            adjustment: from_minor_units(self.adjustment_minor),
            net_tax: from_minor_units(self.net_tax_minor),
            status: self.status()?,
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
