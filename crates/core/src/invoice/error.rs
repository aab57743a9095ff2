//! Invoice error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::InvoiceStatus;
use crate::ledger::error::LedgerError;

/// Errors from invoice transitions and amount checks.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Status change not in the transition table.
    #[error("Invalid invoice status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },

    /// New invoices start as Draft or Sent.
    #[error("Invoices cannot be created with status {0}")]
    InvalidInitialStatus(InvoiceStatus),

    /// Status label not recognised.
    #[error("Unknown invoice status: {0}")]
    UnknownStatus(String),

    /// Payment larger than the amount due.
    #[error("Payment {amount} exceeds amount due {due}")]
    Overpayment {
        /// Payment amount.
        amount: Decimal,
        /// Amount due.
        due: Decimal,
    },

    /// Payment amount does not fit the requested status.
    #[error("Invalid payment amount {amount} for status {status}")]
    InvalidPaymentAmount {
        /// Payment amount.
        amount: Decimal,
        /// Requested status.
        status: InvoiceStatus,
    },

    /// Partial payments need an explicit amount.
    #[error("A payment amount is required for a partial payment")]
    MissingPaymentAmount,

    /// Deposits need a bank account.
    #[error("A deposit account is required to mark an invoice deposited")]
    MissingDepositAccount,

    /// Amounts may only change while the invoice is a draft.
    #[error("Invoice amounts cannot change once the invoice is {0}")]
    AmountsLocked(InvoiceStatus),

    /// Voided invoices are frozen.
    #[error("Voided invoices cannot be modified")]
    VoidedImmutable,

    /// Amounts violate an invariant.
    #[error("Invoice amounts are inconsistent: {0}")]
    InconsistentAmounts(String),

    /// Posting plan failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl InvoiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidInitialStatus(_) => "INVALID_INITIAL_STATUS",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::InvalidPaymentAmount { .. } => "INVALID_PAYMENT_AMOUNT",
            Self::MissingPaymentAmount => "MISSING_PAYMENT_AMOUNT",
            Self::MissingDepositAccount => "MISSING_DEPOSIT_ACCOUNT",
            Self::AmountsLocked(_) => "AMOUNTS_LOCKED",
            Self::VoidedImmutable => "INVOICE_VOIDED",
            Self::InconsistentAmounts(_) => "INCONSISTENT_AMOUNTS",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownStatus(_)
            | Self::InvalidInitialStatus(_)
            | Self::MissingPaymentAmount
            | Self::MissingDepositAccount
            | Self::InvalidPaymentAmount { .. } => 400,
            Self::InvalidTransition { .. }
            | Self::Overpayment { .. }
            | Self::AmountsLocked(_)
            | Self::VoidedImmutable
            | Self::InconsistentAmounts(_) => 422,
            Self::Ledger(e) => e.http_status_code(),
        }
    }

    /// Returns true for violations of stored-data integrity rather than
    /// ordinary business rules.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::VoidedImmutable | Self::InconsistentAmounts(_))
    }
}
