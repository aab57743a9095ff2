//! Expenses, cheques, and supplier bills.

pub mod error;
pub mod service;
pub mod types;

pub use error::ExpenseError;
pub use service::ExpenseService;
pub use types::{ExpenseDraft, ExpenseType};
