//! Invoice lifecycle.
//!
//! Invoices move through a closed set of statuses. Each transition is
//! planned here as new amounts plus the posting events it requires; the
//! persistence layer applies the plan in one transaction.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::InvoiceError;
pub use service::{InvoiceService, InvoiceUpdatePlan};
pub use types::{AmountEdit, InvoiceAmounts, InvoiceSnapshot, InvoiceStatus, InvoiceUpdate};
