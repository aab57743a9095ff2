//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::expense::{ExpenseDraft, ExpenseError, ExpenseType};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub expense_type: String,
    pub payee: String,
    pub expense_date: Date,
    pub expense_account_id: Uuid,
    pub payment_account_id: Option<Uuid>,
    pub subtotal_minor: i64,
    pub tax_code: Option<String>,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub journal_entry_id: Option<Uuid>,
    pub is_paid: bool,
    pub payment_entry_id: Option<Uuid>,
    pub matched_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed expense type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the stored label is not recognized.
    pub fn expense_type(&self) -> Result<ExpenseType, ExpenseError> {
        self.expense_type.parse()
    }

    /// The expense as seen by the posting planner.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the stored type is not recognized.
    pub fn draft(&self) -> Result<ExpenseDraft, ExpenseError> {
        Ok(ExpenseDraft {
            id: self.id.into(),
            expense_type: self.expense_type()?,
            payee: self.payee.clone(),
            date: self.expense_date,
            expense_account: self.expense_account_id.into(),
            payment_account: self.payment_account_id.map(Into::into),
            subtotal: from_minor_units(self.subtotal_minor),
            tax: from_minor_units(self.tax_minor),
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
