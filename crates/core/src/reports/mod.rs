//! Financial report generation.
//!
//! This module provides pure business logic for generating financial reports
//! from posted journal lines:
//! - Profit & Loss, for a period and per month
//! - Balance Sheet, as of a date and per month end
//! - Trial Balance
//! - Sales tax summary
//! - General ledger with running balances
//! - Receivable and payable aging, balances per customer and supplier

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
