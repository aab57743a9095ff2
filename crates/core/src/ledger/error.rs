//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur while building, validating,
//! or reversing journal entries.

use rust_decimal::Decimal;
use tally_shared::types::MoneyError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amount cannot be negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// Zero-based line index.
        line: usize,
    },

    /// Line populates both debit and credit.
    #[error("Line {line} must specify either debit or credit, not both")]
    BothSides {
        /// Zero-based line index.
        line: usize,
    },

    /// Line populates neither side.
    #[error("Line {line} has no amount")]
    EmptyLine {
        /// Zero-based line index.
        line: usize,
    },

    /// Event amount must be positive.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Event totals do not add up.
    #[error("Total {total} does not equal subtotal {subtotal} plus tax {tax}")]
    InconsistentTotals {
        /// Subtotal before tax.
        subtotal: Decimal,
        /// Tax amount.
        tax: Decimal,
        /// Stated total.
        total: Decimal,
    },

    /// Transfer source and destination are the same account.
    #[error("Transfer source and destination must differ")]
    SameAccountTransfer,

    /// Amount cannot be represented in cents.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Unknown account type label.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// Unknown entry source.
    #[error("Unknown entry source: {0}")]
    UnknownEntrySource(String),

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    // ========== Entry State Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Journal entry has already been reversed.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(Uuid),

    /// A reversal entry cannot itself be reversed.
    #[error("Journal entry {0} is a reversal and cannot be reversed")]
    ReversalOfReversal(Uuid),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::BothSides { .. } => "INVALID_ENTRY_SIDE",
            Self::EmptyLine { .. } => "EMPTY_LINE",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::InconsistentTotals { .. } => "INCONSISTENT_TOTALS",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::Money(_) => "INVALID_AMOUNT",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::UnknownEntrySource(_) => "UNKNOWN_ENTRY_SOURCE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::ReversalOfReversal(_) => "REVERSAL_OF_REVERSAL",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InsufficientLines
            | Self::UnbalancedEntry { .. }
            | Self::NegativeAmount { .. }
            | Self::BothSides { .. }
            | Self::EmptyLine { .. }
            | Self::ZeroAmount
            | Self::InconsistentTotals { .. }
            | Self::SameAccountTransfer
            | Self::Money(_)
            | Self::UnknownAccountType(_)
            | Self::UnknownEntrySource(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::EntryNotFound(_) => 404,

            // 422 Unprocessable Entity - business rule violations
            Self::AccountInactive(_) | Self::AlreadyReversed(_) | Self::ReversalOfReversal(_) => {
                422
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_error_message() {
        let error = LedgerError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(90.00),
        };
        assert_eq!(
            error.to_string(),
            "Journal entry is not balanced. Debit: 100.00, Credit: 90.00"
        );
        assert_eq!(error.error_code(), "UNBALANCED_ENTRY");
        assert_eq!(error.http_status_code(), 400);
    }

    #[test]
    fn test_state_errors_are_unprocessable() {
        let id = Uuid::new_v4();
        assert_eq!(LedgerError::AlreadyReversed(id).http_status_code(), 422);
        assert_eq!(LedgerError::AccountInactive(id).http_status_code(), 422);
        assert_eq!(LedgerError::EntryNotFound(id).http_status_code(), 404);
    }
}
