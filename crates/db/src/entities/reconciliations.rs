//! `SeaORM` Entity for reconciliations table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::{ReconciliationError, SessionRef, SessionStatus};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub statement_balance_minor: i64,
    pub status: String,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed status.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored label is not recognized.
    pub fn status(&self) -> Result<SessionStatus, ReconciliationError> {
        self.status.parse()
    }

    /// Statement ending balance.
    #[must_use]
    pub fn statement_balance(&self) -> Decimal {
        from_minor_units(self.statement_balance_minor)
    }

    /// The session as seen by the toggle and completion checks.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored status is not recognized.
    pub fn session(&self) -> Result<SessionRef, ReconciliationError> {
        Ok(SessionRef {
            id: self.id.into(),
            account_id: self.account_id.into(),
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status()?,
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
