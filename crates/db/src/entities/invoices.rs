//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::invoice::{InvoiceAmounts, InvoiceError, InvoiceSnapshot, InvoiceStatus};
use tally_shared::types::money::from_minor_units;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub invoice_number: String,
    pub customer: String,
    pub issue_date: Date,
    pub due_date: Date,
    pub subtotal_minor: i64,
    pub tax_code: Option<String>,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub amount_paid_minor: i64,
    pub amount_deposited_minor: i64,
    pub amount_due_minor: i64,
    pub income_account_id: Option<Uuid>,
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
    pub fn status(&self) -> Result<InvoiceStatus, InvoiceError> {
        self.status.parse()
    }

    /// Amounts in decimal form.
    #[must_use]
    pub fn amounts(&self) -> InvoiceAmounts {
        InvoiceAmounts {
            subtotal: from_minor_units(self.subtotal_minor),
            tax: from_minor_units(self.tax_minor),
            total: from_minor_units(self.total_minor),
            amount_paid: from_minor_units(self.amount_paid_minor),
            amount_deposited: from_minor_units(self.amount_deposited_minor),
            amount_due: from_minor_units(self.amount_due_minor),
        }
    }

    /// The invoice as seen by the lifecycle planner.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` if the stored status is not recognized.
    pub fn snapshot(&self) -> Result<InvoiceSnapshot, InvoiceError> {
        Ok(InvoiceSnapshot {
            id: self.id.into(),
            invoice_number: self.invoice_number.clone(),
            customer: self.customer.clone(),
            issue_date: self.issue_date,
            due_date: self.due_date,
            status: self.status()?,
            amounts: self.amounts(),
            income_account: self.income_account_id.map(Into::into),
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
