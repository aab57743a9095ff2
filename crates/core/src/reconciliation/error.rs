//! Reconciliation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::status::BankTransactionStatus;
use crate::ledger::error::LedgerError;

/// Errors from statement import, rules, status changes, and matching.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    // ========== Import Errors ==========
    /// Column mapping is missing, unknown, or ambiguous.
    #[error("Column mapping error: {0}")]
    ColumnMapping(String),

    /// CSV could not be read.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Import exceeds the configured row limit.
    #[error("Import has {count} rows; the limit is {max}")]
    TooManyRows {
        /// Rows submitted.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Imports go to bank or credit card accounts only.
    #[error("Account is not a bank or credit card account")]
    NotBankAccount,

    // ========== Status Errors ==========
    /// Status change not allowed.
    #[error("Invalid bank transaction status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BankTransactionStatus,
        /// Requested status.
        to: BankTransactionStatus,
    },

    /// Status label not recognised.
    #[error("Unknown bank transaction status: {0}")]
    UnknownStatus(String),

    /// Categorizing needs a category account.
    #[error("A category account is required to categorize a transaction")]
    MissingCategory,

    /// Matched status is reached through matching only.
    #[error("Matching requires a document; use the match operation")]
    MatchRequiresDocument,

    // ========== Rule Errors ==========
    /// Rule definition is invalid.
    #[error("Invalid bank rule: {0}")]
    InvalidRule(String),

    // ========== Matching Errors ==========
    /// Document does not satisfy the match criteria.
    #[error("Document does not match the transaction: {0}")]
    CriteriaNotMet(String),

    // ========== Session Errors ==========
    /// Statement period ends before it starts.
    #[error("Invalid statement period: start {start} is after end {end}")]
    InvalidPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Completed sessions cannot change.
    #[error("Reconciliation is already completed")]
    SessionCompleted,

    /// Line belongs to another account.
    #[error("Transaction is not on the account being reconciled")]
    WrongAccount,

    /// Line is dated after the statement.
    #[error("Transaction dated {0} is after the statement end date")]
    OutsideStatementPeriod(NaiveDate),

    /// Excluded lines never clear.
    #[error("Excluded transactions cannot be reconciled")]
    ExcludedTransaction,

    /// Line was ticked off in another session.
    #[error("Transaction is reconciled in another session")]
    ReconciledElsewhere,

    /// Cleared balance does not agree with the statement.
    #[error("Reconciliation is out of balance by {difference}")]
    OutOfBalance {
        /// Statement balance less cleared balance.
        difference: Decimal,
    },

    /// Posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnMapping(_) => "COLUMN_MAPPING_ERROR",
            Self::Csv(_) => "INVALID_CSV",
            Self::TooManyRows { .. } => "TOO_MANY_ROWS",
            Self::NotBankAccount => "NOT_BANK_ACCOUNT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
            Self::MissingCategory => "MISSING_CATEGORY",
            Self::MatchRequiresDocument => "MATCH_REQUIRES_DOCUMENT",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::CriteriaNotMet(_) => "MATCH_CRITERIA_NOT_MET",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::SessionCompleted => "RECONCILIATION_COMPLETED",
            Self::WrongAccount => "WRONG_ACCOUNT",
            Self::OutsideStatementPeriod(_) => "OUTSIDE_STATEMENT_PERIOD",
            Self::ExcludedTransaction => "EXCLUDED_TRANSACTION",
            Self::ReconciledElsewhere => "RECONCILED_ELSEWHERE",
            Self::OutOfBalance { .. } => "OUT_OF_BALANCE",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ColumnMapping(_)
            | Self::Csv(_)
            | Self::TooManyRows { .. }
            | Self::UnknownStatus(_)
            | Self::MissingCategory
            | Self::MatchRequiresDocument
            | Self::InvalidRule(_)
            | Self::InvalidPeriod { .. } => 400,
            Self::NotBankAccount
            | Self::InvalidTransition { .. }
            | Self::CriteriaNotMet(_)
            | Self::SessionCompleted
            | Self::WrongAccount
            | Self::OutsideStatementPeriod(_)
            | Self::ExcludedTransaction
            | Self::ReconciledElsewhere
            | Self::OutOfBalance { .. } => 422,
            Self::Ledger(e) => e.http_status_code(),
        }
    }
}
