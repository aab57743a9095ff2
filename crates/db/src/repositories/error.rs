//! Repository error type.
//!
//! Wraps the domain errors raised while planning a mutation together with
//! the storage errors raised while applying it.

use sea_orm::{DbErr, SqlErr};
use tally_core::audit::AuditError;
use tally_core::expense::ExpenseError;
use tally_core::invoice::InvoiceError;
use tally_core::ledger::LedgerError;
use tally_core::reconciliation::ReconciliationError;
use tally_core::reports::ReportError;
use tally_core::tax::TaxError;
use tally_shared::types::MoneyError;
use uuid::Uuid;

/// Errors returned by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    // ========== Lookup & Uniqueness ==========
    /// Record not found in the organization.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Requested ID.
        id: Uuid,
    },

    /// Organization not found.
    #[error("Organization not found: {0}")]
    OrganizationNotFound(Uuid),

    /// A unique value is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Integrity ==========
    /// Account has journal lines and cannot be deleted.
    #[error("Account {0} has journal history; deactivate it instead")]
    AccountHasHistory(Uuid),

    /// Account type cannot change once lines are posted.
    #[error("Account {0} has journal history; its type cannot change")]
    AccountTypeLocked(Uuid),

    /// Stored data could not be read back.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    // ========== Domain ==========
    /// Ledger rule violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Invoice rule violation.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Expense rule violation.
    #[error(transparent)]
    Expense(#[from] ExpenseError),

    /// Reconciliation rule violation.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// Tax rule violation.
    #[error(transparent)]
    Tax(#[from] TaxError),

    /// Report parameter error.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Audit parsing or export error.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Amount cannot be stored in minor units.
    #[error(transparent)]
    Money(#[from] MoneyError),

    // ========== Infrastructure ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Shorthand for a missing record.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Maps a unique-index violation to `Conflict`, passing other errors through.
    #[must_use]
    pub fn from_insert(error: DbErr, what: impl Into<String>) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict(what.into()),
            _ => Self::Database(error),
        }
    }

    /// Returns true when a serializable transaction lost a race.
    #[must_use]
    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, Self::Database(e) if e.to_string().contains("could not serialize access"))
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::OrganizationNotFound(_) => "ORGANIZATION_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AccountHasHistory(_) => "ACCOUNT_HAS_HISTORY",
            Self::AccountTypeLocked(_) => "ACCOUNT_TYPE_LOCKED",
            Self::Corrupt(_) => "CORRUPT_RECORD",
            Self::Ledger(e) => e.error_code(),
            Self::Invoice(e) => e.error_code(),
            Self::Expense(e) => e.error_code(),
            Self::Reconciliation(e) => e.error_code(),
            Self::Tax(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Audit(e) => e.error_code(),
            Self::Money(_) => "INVALID_AMOUNT",
            Self::Database(_) if self.is_serialization_failure() => "SERIALIZATION_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::OrganizationNotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Validation(_) => 400,
            Self::AccountHasHistory(_) | Self::AccountTypeLocked(_) => 422,
            Self::Ledger(e) => e.http_status_code(),
            Self::Invoice(e) => e.http_status_code(),
            Self::Expense(e) => e.http_status_code(),
            Self::Reconciliation(e) => e.http_status_code(),
            Self::Tax(e) => e.http_status_code(),
            Self::Report(e) => e.http_status_code(),
            Self::Audit(e) => e.http_status_code(),
            Self::Money(_) => 400,
            Self::Database(_) if self.is_serialization_failure() => 409,
            Self::Corrupt(_) | Self::Database(_) => 500,
        }
    }

    /// Returns true for errors whose detail must not reach the caller.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.http_status_code() >= 500
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Corrupt(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_their_codes() {
        let error = RepositoryError::from(LedgerError::UnbalancedEntry {
            debit: rust_decimal::Decimal::ONE,
            credit: rust_decimal::Decimal::ZERO,
        });
        assert_eq!(error.error_code(), "UNBALANCED_ENTRY");
        assert_eq!(error.http_status_code(), 400);
    }

    #[test]
    fn test_history_is_integrity_error() {
        let error = RepositoryError::AccountHasHistory(Uuid::new_v4());
        assert_eq!(error.error_code(), "ACCOUNT_HAS_HISTORY");
        assert_eq!(error.http_status_code(), 422);
    }

    #[test]
    fn test_database_errors_are_internal() {
        let error = RepositoryError::Database(DbErr::Custom("boom".into()));
        assert!(error.is_internal());
        assert_eq!(error.error_code(), "DATABASE_ERROR");
    }
}
