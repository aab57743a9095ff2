//! `SeaORM` Entity for journal_lines table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::JournalLineInput;
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub memo: Option<String>,
    pub sort_order: i32,
}

impl Model {
    /// Debit amount.
    #[must_use]
    pub fn debit(&self) -> Decimal {
        from_minor_units(self.debit_minor)
    }

    /// Credit amount.
    #[must_use]
    pub fn credit(&self) -> Decimal {
        from_minor_units(self.credit_minor)
    }

    /// The line as ledger input, for reversal planning.
    #[must_use]
    pub fn to_input(&self) -> JournalLineInput {
        JournalLineInput {
            account_id: self.account_id.into(),
            debit: self.debit(),
            credit: self.credit(),
            memo: self.memo.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::EntryId",
        to = "super::journal_entries::Column::Id"
    )]
    JournalEntries,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
