//! `SeaORM` Entity for tax_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::tax::{TaxRate, rate_from_thousandths};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    /// Rate percent times one thousand (13% = 13000).
    pub rate_thousandths: i64,
    pub agency: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The rate in domain form.
    #[must_use]
    pub fn rate(&self) -> TaxRate {
        TaxRate {
            code: self.code.clone(),
            name: self.name.clone(),
            rate: rate_from_thousandths(self.rate_thousandths),
            agency: self.agency.clone(),
            is_active: self.is_active,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
