//! `SeaORM` Entity for bank_transactions table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::reconciliation::{BankLine, BankTransactionStatus, ReconciliationError};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    pub txn_date: Date,
    pub description: String,
    pub amount_minor: i64,
    pub status: String,
    pub category_account_id: Option<Uuid>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub rule_id: Option<Uuid>,
    pub journal_entry_id: Option<Uuid>,
    pub matched_kind: Option<String>,
    pub matched_id: Option<Uuid>,
    pub reconciliation_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed review status.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored label is not recognized.
    pub fn status(&self) -> Result<BankTransactionStatus, ReconciliationError> {
        self.status.parse()
    }

    /// Signed amount: deposits positive, withdrawals negative.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        from_minor_units(self.amount_minor)
    }

    /// True once ticked off in a reconciliation session.
    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        self.reconciliation_id.is_some()
    }

    /// The statement line used for matching.
    #[must_use]
    pub fn line(&self) -> BankLine {
        BankLine {
            date: self.txn_date,
            description: self.description.clone(),
            amount: self.amount(),
        }
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
