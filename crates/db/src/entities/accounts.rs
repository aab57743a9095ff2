//! `SeaORM` Entity for accounts table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{AccountInfo, AccountType, LedgerError};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub account_type: String,
    pub detail_type: Option<String>,
    pub balance_minor: i64,
    pub bank_balance_minor: Option<i64>,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed account type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccountType` if the stored label is not recognized.
    pub fn account_type(&self) -> Result<AccountType, LedgerError> {
        self.account_type.parse()
    }

    /// Ledger balance, signed by the account's normal side.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        from_minor_units(self.balance_minor)
    }

    /// Statement-side balance of a bank account.
    #[must_use]
    pub fn bank_balance(&self) -> Option<Decimal> {
        self.bank_balance_minor.map(from_minor_units)
    }

    /// Header used by report aggregation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccountType` if the stored label is not recognized.
    pub fn info(&self) -> Result<AccountInfo, LedgerError> {
        Ok(AccountInfo {
            id: self.id.into(),
            name: self.name.clone(),
            account_type: self.account_type()?,
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
