//! `SeaORM` Entity for journal_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{EntrySource, LedgerError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub entry_number: String,
    pub entry_date: Date,
    pub memo: String,
    pub source: String,
    pub source_id: Option<Uuid>,
    pub reverses_entry_id: Option<Uuid>,
    pub reversed_by_entry_id: Option<Uuid>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed entry source.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntrySource` if the stored label is not recognized.
    pub fn source(&self) -> Result<EntrySource, LedgerError> {
        self.source.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
