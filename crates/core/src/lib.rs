//! Core bookkeeping logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry validation, balance rules, numbering, reversals
//! - `posting` - Business events translated into balanced journal lines
//! - `invoice` - Invoice status machine and amount bookkeeping
//! - `expense` - Expenses, cheques, and bills
//! - `tax` - Sales tax rates, tax lines, and filings
//! - `reconciliation` - Bank statement import, rules, matching, review states
//! - `reports` - Profit & Loss, balance sheet, trial balance
//! - `audit` - Audit trail actions, summaries, and exports

pub mod audit;
pub mod expense;
pub mod invoice;
pub mod ledger;
pub mod posting;
pub mod reconciliation;
pub mod reports;
pub mod tax;
