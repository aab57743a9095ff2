//! Expense domain types.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ExpenseId};

use super::error::ExpenseError;

/// Kind of purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    /// Paid immediately by card or bank.
    Expense,
    /// Paid immediately by cheque.
    Cheque,
    /// Recorded on account and paid later.
    Bill,
}

impl ExpenseType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Cheque => "cheque",
            Self::Bill => "bill",
        }
    }

    /// Returns true if the purchase is paid when recorded.
    #[must_use]
    pub const fn is_paid_on_record(self) -> bool {
        !matches!(self, Self::Bill)
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExpenseType {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "expense" => Ok(Self::Expense),
            "cheque" | "cheque expense" | "check" => Ok(Self::Cheque),
            "bill" => Ok(Self::Bill),
            _ => Err(ExpenseError::UnknownType(s.to_string())),
        }
    }
}

/// An expense as recorded, before or after persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    /// Expense ID.
    pub id: ExpenseId,
    /// Kind of purchase.
    pub expense_type: ExpenseType,
    /// Payee or supplier.
    pub payee: String,
    /// Purchase date.
    pub date: NaiveDate,
    /// Expense account debited.
    pub expense_account: AccountId,
    /// Account the purchase was paid from; unused for bills.
    pub payment_account: Option<AccountId>,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Recoverable sales tax.
    pub tax: Decimal,
}

impl ExpenseDraft {
    /// Subtotal plus tax.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal + self.tax
    }
}
