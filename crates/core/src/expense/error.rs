//! Expense error types.

use thiserror::Error;

use crate::ledger::error::LedgerError;

/// Errors from expense and bill handling.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Expenses and cheques need the account they were paid from.
    #[error("A payment account is required for this expense type")]
    MissingPaymentAccount,

    /// Only bills can be paid later.
    #[error("Only bills can be paid")]
    NotABill,

    /// Bill has already been paid.
    #[error("Bill has already been paid")]
    BillAlreadyPaid,

    /// Expense type label not recognised.
    #[error("Unknown expense type: {0}")]
    UnknownType(String),

    /// Posting plan failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ExpenseError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingPaymentAccount => "MISSING_PAYMENT_ACCOUNT",
            Self::NotABill => "NOT_A_BILL",
            Self::BillAlreadyPaid => "BILL_ALREADY_PAID",
            Self::UnknownType(_) => "UNKNOWN_EXPENSE_TYPE",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingPaymentAccount | Self::UnknownType(_) => 400,
            Self::NotABill | Self::BillAlreadyPaid => 422,
            Self::Ledger(e) => e.http_status_code(),
        }
    }
}
