//! Tax error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::filing::TaxFilingStatus;

/// Errors from tax rate lookup, computation, and filings.
#[derive(Debug, Error)]
pub enum TaxError {
    /// No rate with this code.
    #[error("Unknown tax rate: {0}")]
    UnknownRate(String),

    /// Rate exists but is inactive.
    #[error("Tax rate {0} is inactive")]
    InactiveRate(String),

    /// Rate is outside 0..=100 or has more than three decimals.
    #[error("Invalid tax rate: {0}")]
    InvalidRate(Decimal),

    /// Filing period ends before it starts.
    #[error("Filing period is invalid")]
    InvalidPeriod,

    /// Filing status cannot move backwards or skip ahead.
    #[error("Invalid filing status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: TaxFilingStatus,
        /// Requested status.
        to: TaxFilingStatus,
    },

    /// Status label not recognised.
    #[error("Unknown filing status: {0}")]
    UnknownStatus(String),
}

impl TaxError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownRate(_) => "UNKNOWN_TAX_RATE",
            Self::InactiveRate(_) => "INACTIVE_TAX_RATE",
            Self::InvalidRate(_) => "INVALID_TAX_RATE",
            Self::InvalidPeriod => "INVALID_PERIOD",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 422,
            _ => 400,
        }
    }
}
