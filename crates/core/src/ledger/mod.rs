//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account types and their normal balances
//! - Journal line validation
//! - Balance calculations and per-account aggregation
//! - Entry and invoice numbering
//! - Reversing entries

pub mod balance;
pub mod error;
pub mod numbering;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{
    AccountInfo, AccountTotals, DateWindow, PostedLine, aggregate_totals, calculate_balance_change,
};
pub use error::LedgerError;
pub use numbering::{format_entry_number, format_invoice_number, next_sequence};
pub use reversal::{PostedEntry, ReversalPlan, ReversalService};
pub use types::{
    AccountCategory, AccountType, EntrySource, EntryTotals, JournalLineInput, LineAmounts,
    NormalBalance,
};
pub use validation::validate_lines;
